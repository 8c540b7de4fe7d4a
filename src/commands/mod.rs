pub mod coin;
pub mod help;
pub mod refresh;
pub mod resolution;
pub mod sort;
pub mod view;
pub mod volume;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info};

use crate::session::Session;

/// What the loop does after a control ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Redraw the dashboard
    Render,
    /// Print a message without redrawing
    Message(String),
    Quit,
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Flow, String>> + 'a>>;
pub type Handler = for<'a> fn(&'a mut Session, &'a [String]) -> HandlerFuture<'a>;

/// One entry of the control manifest
pub struct Control {
    pub names: &'static [&'static str],
    pub usage: &'static str,
    pub summary: &'static str,
    pub handler: Handler,
}

/// Every control the dashboard answers to, in help order
pub const MANIFEST: &[Control] = &[
    Control {
        names: &["select-coin", "coin", "c"],
        usage: "select-coin <SYMBOL>",
        summary: "Show the chart for a coin",
        handler: coin::execute,
    },
    Control {
        names: &["resolution", "res", "r"],
        usage: "resolution <month|week|day>",
        summary: "Change the chart range",
        handler: resolution::execute,
    },
    Control {
        names: &["refresh-all", "refresh"],
        usage: "refresh-all",
        summary: "Clear the cache and reload everything",
        handler: refresh::refresh_all,
    },
    Control {
        names: &["toggle-auto-refresh", "auto"],
        usage: "toggle-auto-refresh",
        summary: "Turn the refresh timer on or off",
        handler: refresh::toggle_auto_refresh,
    },
    Control {
        names: &["toggle-volume", "volume"],
        usage: "toggle-volume",
        summary: "Show or hide the volume column",
        handler: volume::execute,
    },
    Control {
        names: &["sort"],
        usage: "sort <change|volume>",
        summary: "Sort the board; repeat to flip direction",
        handler: sort::execute,
    },
    Control {
        names: &["close-error", "dismiss"],
        usage: "close-error",
        summary: "Dismiss the error banner",
        handler: view::close_error,
    },
    Control {
        names: &["show", "s"],
        usage: "show",
        summary: "Redraw the dashboard",
        handler: view::show,
    },
    Control {
        names: &["help", "h", "?"],
        usage: "help",
        summary: "List controls",
        handler: help::execute,
    },
    Control {
        names: &["quit", "exit", "q"],
        usage: "quit",
        summary: "Save preferences and exit",
        handler: view::quit,
    },
];

/// Control name (and alias) lookup built once at startup
pub struct ControlTable {
    handlers: HashMap<&'static str, Handler>,
}

impl ControlTable {
    pub fn from_manifest(manifest: &'static [Control]) -> Self {
        let mut handlers = HashMap::new();
        for control in manifest {
            for name in control.names {
                handlers.insert(*name, control.handler);
            }
        }
        debug!("Registered {} control names", handlers.len());
        Self { handlers }
    }

    /// Run one input line against the table. Unknown controls only produce a hint.
    pub async fn dispatch(&self, session: &mut Session, line: &str) -> Result<Flow, String> {
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let (name, args) = match parts.split_first() {
            Some((name, args)) => (name.to_lowercase(), args),
            None => return Ok(Flow::Message(String::new())),
        };

        match self.handlers.get(name.as_str()) {
            Some(handler) => {
                info!("Control {} called with args: {:?}", name, args);
                handler(session, args).await
            }
            None => Ok(Flow::Message(format!(
                "Unknown control '{}'. Type `help` to list controls.",
                name
            ))),
        }
    }
}
