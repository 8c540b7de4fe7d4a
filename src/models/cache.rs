//! Freshness cache models

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored form of a cache entry. Timestamps are unix milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: i64,
    pub expires_at: i64,
}

impl CacheEntry {
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

/// A cache hit: the stored payload and the time left before it expires
#[derive(Debug, Clone)]
pub struct CachedValue {
    pub value: Value,
    pub remaining: Duration,
}
