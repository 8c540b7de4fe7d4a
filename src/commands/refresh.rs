use chrono::Utc;

use super::{Flow, HandlerFuture};
use crate::session::Session;
use crate::utils::format::format_next_refresh;

pub fn refresh_all<'a>(session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move {
        session.refresh_all_data().await;
        Ok(Flow::Render)
    })
}

pub fn toggle_auto_refresh<'a>(session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(toggle(session))
}

async fn toggle(session: &mut Session) -> Result<Flow, String> {
    let enabled = session.toggle_auto_refresh().await?;
    let status = format_next_refresh(session.auto_refresh_deadline(), Utc::now());
    Ok(Flow::Message(format!(
        "Auto-refresh {} ({})",
        if enabled { "on" } else { "off" },
        status
    )))
}
