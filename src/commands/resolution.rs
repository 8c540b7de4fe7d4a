use super::{Flow, HandlerFuture};
use crate::models::Resolution;
use crate::session::Session;

pub fn execute<'a>(session: &'a mut Session, args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(select_resolution(session, args))
}

async fn select_resolution(session: &mut Session, args: &[String]) -> Result<Flow, String> {
    let resolution: Resolution = args
        .first()
        .ok_or("Usage: resolution <month|week|day>")?
        .parse()?;

    if session.select_resolution(resolution).await {
        Ok(Flow::Render)
    } else {
        // Hourly-only coins ignore anything but the day view
        Ok(Flow::Message(format!(
            "{} only offers the day view",
            session.current_coin().symbol
        )))
    }
}
