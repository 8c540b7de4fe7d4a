use super::{Flow, HandlerFuture};
use crate::models::COINS;
use crate::session::Session;

pub fn execute<'a>(session: &'a mut Session, args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(select_coin(session, args))
}

async fn select_coin(session: &mut Session, args: &[String]) -> Result<Flow, String> {
    let symbol = match args.first() {
        Some(symbol) => symbol,
        None => {
            let symbols: Vec<&str> = COINS.iter().map(|c| c.symbol).collect();
            return Err(format!("Usage: select-coin <SYMBOL>. Coins: {}", symbols.join(", ")));
        }
    };

    session.select_coin(symbol).await?;
    Ok(Flow::Render)
}
