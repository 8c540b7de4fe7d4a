//! Scalar dashboard preferences kept next to the cache entries
//!
//! These keys sit outside the cache namespaces so a bulk cache clear
//! leaves them alone.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::warn;

use super::local_storage;

pub const AUTO_REFRESH_ENABLED: &str = "autoRefreshEnabled";
pub const NEXT_REFRESH_TIME: &str = "nextRefreshTime";
pub const LAST_REFRESHED_TIME: &str = "lastRefreshedTime";
pub const VOLUME_TOGGLE_STATE: &str = "volumeToggleState";

pub async fn get_flag(pool: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
    Ok(local_storage::get_item(pool, key).await?.as_deref() == Some("true"))
}

pub async fn set_flag(pool: &SqlitePool, key: &str, value: bool) -> Result<(), sqlx::Error> {
    local_storage::set_item(pool, key, if value { "true" } else { "false" }).await
}

/// Read a unix-millisecond timestamp; unparseable values read as absent
pub async fn get_time(pool: &SqlitePool, key: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let raw = match local_storage::get_item(pool, key).await? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    match raw.parse::<i64>().ok().and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
        Some(time) => Ok(Some(time)),
        None => {
            warn!("Ignoring malformed timestamp preference {}: {}", key, raw);
            Ok(None)
        }
    }
}

pub async fn set_time(pool: &SqlitePool, key: &str, time: DateTime<Utc>) -> Result<(), sqlx::Error> {
    local_storage::set_item(pool, key, &time.timestamp_millis().to_string()).await
}

pub async fn remove(pool: &SqlitePool, key: &str) -> Result<(), sqlx::Error> {
    local_storage::remove_item(pool, key).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flags_default_to_false() {
        let pool = crate::db::test_pool().await;
        assert!(!get_flag(&pool, VOLUME_TOGGLE_STATE).await.unwrap());
        set_flag(&pool, VOLUME_TOGGLE_STATE, true).await.unwrap();
        assert!(get_flag(&pool, VOLUME_TOGGLE_STATE).await.unwrap());
    }

    #[tokio::test]
    async fn test_time_roundtrip_and_garbage() {
        let pool = crate::db::test_pool().await;
        let time = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        set_time(&pool, NEXT_REFRESH_TIME, time).await.unwrap();
        assert_eq!(get_time(&pool, NEXT_REFRESH_TIME).await.unwrap(), Some(time));

        local_storage::set_item(&pool, LAST_REFRESHED_TIME, "soon").await.unwrap();
        assert_eq!(get_time(&pool, LAST_REFRESHED_TIME).await.unwrap(), None);
    }
}
