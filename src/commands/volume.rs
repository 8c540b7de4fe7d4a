use super::{Flow, HandlerFuture};
use crate::session::Session;

pub fn execute<'a>(session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move {
        session.toggle_volume().await;
        Ok(Flow::Render)
    })
}
