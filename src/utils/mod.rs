pub mod errors;
pub mod format;
pub mod ratelimit;
pub mod table;

pub use errors::{chart_error_message, extract_clean_error};
pub use ratelimit::RateLimiter;
pub use table::Table;
