use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Body posted to the read-url proxy
#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequest<'a> {
    pub url: &'a str,
    pub headers: BTreeMap<&'a str, &'a str>,
}

/// Failures of an outbound price request
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Transport failure before any response arrived
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    /// 429 Too Many Requests
    #[error("Rate limited by {0}")]
    RateLimited(String),
    /// Any other non-2xx status
    #[error("HTTP Error: {status} {message}")]
    Http { status: u16, message: String },
    /// Body was not JSON
    #[error("Invalid JSON response: {0}")]
    Parse(String),
    /// The vendor or proxy answered with an error envelope
    #[error("{0}")]
    Vendor(String),
    #[error("No configuration found for coin: {0}")]
    UnknownCoin(String),
    /// JSON that lacks the fields we need
    #[error("Invalid data structure received for {0}")]
    InvalidShape(String),
    #[error("Client setup failed: {0}")]
    Setup(String),
}
