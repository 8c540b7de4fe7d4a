use super::{Flow, HandlerFuture, MANIFEST};
use crate::models::COINS;
use crate::session::Session;

pub fn execute<'a>(_session: &'a mut Session, _args: &'a [String]) -> HandlerFuture<'a> {
    Box::pin(async move { Ok(Flow::Message(help_text())) })
}

pub fn help_text() -> String {
    let width = MANIFEST.iter().map(|c| c.usage.len()).max().unwrap_or(0);

    let mut text = String::from("📖 Price Chart Controls\n");
    for control in MANIFEST {
        text.push_str(&format!("  {:<width$}  {}", control.usage, control.summary, width = width));
        if control.names.len() > 1 {
            text.push_str(&format!(" (aliases: {})", control.names[1..].join(", ")));
        }
        text.push('\n');
    }

    let symbols: Vec<&str> = COINS.iter().map(|c| c.symbol).collect();
    text.push_str(&format!("\nCoins: {}\nWOW charts are only available for the last 24 hours.\n", symbols.join(", ")));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_every_control() {
        let text = help_text();
        for control in MANIFEST {
            assert!(text.contains(control.usage));
        }
        assert!(text.contains("aliases: exit, q"));
    }
}
