//! Freshness cache: JSON payloads with a per-entry expiry, kept in local storage
//!
//! Entries are evicted lazily when a read finds them expired or unreadable,
//! and eagerly by [`FreshnessCache::clear`] during a bulk refresh. Storage
//! errors never fail the caller; they are logged and read as a miss.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, error, warn};

use crate::db::local_storage;
use crate::models::{CacheEntry, CachedValue, Resolution};

pub const COIN_DATA_PREFIX: &str = "coinData_";
pub const CHART_DATA_PREFIX: &str = "chartData_";
pub const CACHE_NAMESPACES: [&str; 2] = [COIN_DATA_PREFIX, CHART_DATA_PREFIX];

pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Cache key for a coin's live snapshot
pub fn coin_data_key(symbol: &str) -> String {
    format!("{}{}", COIN_DATA_PREFIX, symbol)
}

/// Cache key for a coin's history at one resolution
pub fn chart_data_key(symbol: &str, resolution: Resolution) -> String {
    format!("{}{}_{}", CHART_DATA_PREFIX, symbol, resolution.as_str())
}

#[derive(Debug, Clone)]
pub struct FreshnessCache {
    pool: SqlitePool,
    default_ttl: Duration,
}

impl FreshnessCache {
    pub fn new(pool: SqlitePool, default_ttl: Duration) -> Self {
        Self { pool, default_ttl }
    }

    /// Store a payload, overwriting any entry under `key`.
    /// A missing or non-positive `ttl` falls back to the default TTL.
    pub async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) {
        self.set_at(key, value, ttl, Utc::now()).await
    }

    pub async fn set_at(&self, key: &str, value: &Value, ttl: Option<Duration>, now: DateTime<Utc>) {
        let ttl = ttl
            .filter(|t| *t > Duration::zero())
            .unwrap_or(self.default_ttl);
        let stored_at = now.timestamp_millis();
        let expires_at = match stored_at.checked_add(ttl.num_milliseconds()) {
            Some(expires_at) => expires_at,
            None => {
                warn!("TTL for cache entry {} out of range, not caching", key);
                return;
            }
        };
        let entry = CacheEntry {
            value: value.clone(),
            stored_at,
            expires_at,
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        match local_storage::set_item(&self.pool, key, &serialized).await {
            Ok(()) => debug!("Cached {} for {}s", key, ttl.num_seconds()),
            Err(e) => warn!("Failed to store cache entry {}: {}", key, e),
        }
    }

    /// Fetch a live entry. Expired or unreadable entries are deleted and read as absent.
    pub async fn get(&self, key: &str) -> Option<CachedValue> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CachedValue> {
        let raw = match local_storage::get_item(&self.pool, key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                error!("Error parsing cache item {}: {}", key, e);
                self.evict(key).await;
                return None;
            }
        };

        let now_ms = now.timestamp_millis();
        if entry.is_fresh(now_ms) {
            Some(CachedValue {
                value: entry.value,
                remaining: Duration::milliseconds(entry.expires_at - now_ms),
            })
        } else {
            debug!("Cache entry {} expired", key);
            self.evict(key).await;
            None
        }
    }

    #[cfg(test)]
    pub async fn is_valid(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Remove every entry in the cache namespaces. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let keys = match local_storage::keys(&self.pool).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list cache entries: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys
            .iter()
            .filter(|k| CACHE_NAMESPACES.iter().any(|ns| k.starts_with(ns)))
        {
            match local_storage::remove_item(&self.pool, key).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove cache entry {}: {}", key, e),
            }
        }

        debug!("Cleared {} cache entries", removed);
        removed
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = local_storage::remove_item(&self.pool, key).await {
            warn!("Failed to evict cache entry {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn cache() -> FreshnessCache {
        FreshnessCache::new(crate::db::test_pool().await, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    #[test]
    fn test_keys() {
        assert_eq!(coin_data_key("BTC"), "coinData_BTC");
        assert_eq!(chart_data_key("WOW", Resolution::Day), "chartData_WOW_day");
    }

    #[tokio::test]
    async fn test_get_after_set_returns_value() {
        let cache = cache().await;
        let payload = json!({"RAW": {"BTC": {"USD": {"PRICE": 50000.5}}}});

        cache.set("coinData_BTC", &payload, None).await;
        let hit = cache.get("coinData_BTC").await.unwrap();

        assert_eq!(hit.value, payload);
        assert!(hit.remaining > Duration::zero());
        assert!(hit.remaining <= Duration::minutes(15));
        assert!(cache.is_valid("coinData_BTC").await);
    }

    #[tokio::test]
    async fn test_ttl_override_remaining_time() {
        let cache = cache().await;
        cache.set("chartData_BTC_month", &json!([1, 2]), Some(Duration::milliseconds(1000))).await;

        let hit = cache.get("chartData_BTC_month").await.unwrap();
        assert!(hit.remaining > Duration::zero());
        assert!(hit.remaining <= Duration::milliseconds(1000));
    }

    #[tokio::test]
    async fn test_non_positive_ttl_uses_default() {
        let cache = cache().await;
        let now = Utc::now();
        cache.set_at("coinData_XMR", &json!(1), Some(Duration::zero()), now).await;

        let hit = cache.get_at("coinData_XMR", now).await.unwrap();
        assert_eq!(hit.remaining, Duration::minutes(DEFAULT_TTL_MINUTES));
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_not_stored() {
        let cache = cache().await;
        cache.set("coinData_DOGE", &json!(1), Some(Duration::milliseconds(i64::MAX))).await;

        assert!(cache.get("coinData_DOGE").await.is_none());
        assert_eq!(local_storage::get_item(&cache.pool, "coinData_DOGE").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let cache = cache().await;
        let now = Utc::now();
        cache.set_at("coinData_LTC", &json!({"a": 1}), Some(Duration::seconds(60)), now).await;

        assert!(cache.get_at("coinData_LTC", now + Duration::seconds(59)).await.is_some());
        assert!(cache.get_at("coinData_LTC", now + Duration::seconds(60)).await.is_none());
        assert_eq!(local_storage::get_item(&cache.pool, "coinData_LTC").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_a_miss_and_deleted() {
        let cache = cache().await;
        local_storage::set_item(&cache.pool, "coinData_ETH", "{not json").await.unwrap();

        assert!(cache.get("coinData_ETH").await.is_none());
        assert_eq!(local_storage::get_item(&cache.pool, "coinData_ETH").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_only_touches_cache_namespaces() {
        let cache = cache().await;
        cache.set("coinData_BTC", &json!(1), None).await;
        cache.set("chartData_BTC_week", &json!(2), None).await;
        local_storage::set_item(&cache.pool, "autoRefreshEnabled", "true").await.unwrap();
        local_storage::set_item(&cache.pool, "somethingElse", "x").await.unwrap();

        assert_eq!(cache.clear().await, 2);

        let keys = local_storage::keys(&cache.pool).await.unwrap();
        assert_eq!(keys, vec!["autoRefreshEnabled".to_string(), "somethingElse".to_string()]);
    }
}
