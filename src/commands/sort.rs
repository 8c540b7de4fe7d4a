use super::{Flow, HandlerFuture};
use crate::services::board_service::SortColumn;
use crate::session::Session;

pub fn execute<'a>(session: &'a mut Session, args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move { sort_board(session, args) })
}

fn sort_board(session: &mut Session, args: &[String]) -> Result<Flow, String> {
    let column: SortColumn = args
        .first()
        .ok_or("Usage: sort <change|volume>")?
        .parse()?;

    let direction = session.sort_board(column);
    tracing::debug!("Board sorted by {} {:?}", column, direction);
    Ok(Flow::Render)
}
