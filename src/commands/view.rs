use super::{Flow, HandlerFuture};
use crate::session::Session;

pub fn show<'a>(_session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move { Ok(Flow::Render) })
}

pub fn close_error<'a>(session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move {
        session.close_error();
        Ok(Flow::Render)
    })
}

pub fn quit<'a>(_session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move { Ok(Flow::Quit) })
}
