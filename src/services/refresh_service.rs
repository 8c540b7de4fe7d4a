//! Auto-refresh schedule persisted across runs

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::db::preferences::{self, AUTO_REFRESH_ENABLED, NEXT_REFRESH_TIME};

pub const DEFAULT_INTERVAL_MINUTES: i64 = 15;

#[derive(Debug, Clone)]
pub struct AutoRefresh {
    pool: SqlitePool,
    interval: Duration,
    enabled: bool,
    next_refresh: Option<DateTime<Utc>>,
}

impl AutoRefresh {
    /// A stopped schedule; call `init` to resume from stored preferences
    pub fn new(pool: SqlitePool, interval: Duration) -> Self {
        Self {
            pool,
            interval,
            enabled: false,
            next_refresh: None,
        }
    }

    /// Resume the schedule stored by a previous run. A stored time that
    /// already passed is replaced by a fresh interval.
    pub async fn init(&mut self, now: DateTime<Utc>) -> Result<(), String> {
        let enabled = preferences::get_flag(&self.pool, AUTO_REFRESH_ENABLED)
            .await
            .map_err(|e| format!("Failed to read auto-refresh preference: {}", e))?;

        if !enabled {
            debug!("Auto-refresh disabled by stored preference");
            return Ok(());
        }

        let stored = preferences::get_time(&self.pool, NEXT_REFRESH_TIME)
            .await
            .map_err(|e| format!("Failed to read next refresh time: {}", e))?;

        match stored {
            Some(time) if time > now => {
                self.next_refresh = Some(time);
                self.start(false, now).await
            }
            _ => self.start(true, now).await,
        }
    }

    /// Enable and schedule. Keeps an already scheduled future time unless `reset`.
    pub async fn start(&mut self, reset: bool, now: DateTime<Utc>) -> Result<(), String> {
        let next = match self.next_refresh {
            Some(time) if !reset && time > now => time,
            _ => now
                .checked_add_signed(self.interval)
                .ok_or_else(|| format!("Auto-refresh interval out of range: {}", self.interval))?,
        };

        self.next_refresh = Some(next);
        self.enabled = true;

        preferences::set_time(&self.pool, NEXT_REFRESH_TIME, next)
            .await
            .map_err(|e| format!("Failed to store next refresh time: {}", e))?;
        preferences::set_flag(&self.pool, AUTO_REFRESH_ENABLED, true)
            .await
            .map_err(|e| format!("Failed to store auto-refresh preference: {}", e))?;

        info!("Auto-refresh scheduled for {}", next.format("%H:%M:%S UTC"));
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), String> {
        self.next_refresh = None;
        self.enabled = false;

        preferences::remove(&self.pool, NEXT_REFRESH_TIME)
            .await
            .map_err(|e| format!("Failed to clear next refresh time: {}", e))?;
        preferences::set_flag(&self.pool, AUTO_REFRESH_ENABLED, false)
            .await
            .map_err(|e| format!("Failed to store auto-refresh preference: {}", e))?;

        info!("Auto-refresh stopped");
        Ok(())
    }

    /// Flip the schedule on or off, returning the new state
    pub async fn toggle(&mut self, now: DateTime<Utc>) -> Result<bool, String> {
        if self.enabled {
            self.stop().await?;
        } else {
            self.start(false, now).await?;
        }
        Ok(self.enabled)
    }

    /// Time the next automatic refresh is due, if enabled
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        if self.enabled {
            self.next_refresh
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_start_persists_schedule() {
        let pool = crate::db::test_pool().await;
        let mut refresh = AutoRefresh::new(pool.clone(), Duration::minutes(15));

        refresh.start(false, at(0)).await.unwrap();
        assert_eq!(refresh.deadline(), Some(at(15)));
        assert!(preferences::get_flag(&pool, AUTO_REFRESH_ENABLED).await.unwrap());
        assert_eq!(preferences::get_time(&pool, NEXT_REFRESH_TIME).await.unwrap(), Some(at(15)));

        // Without reset a pending time is kept
        refresh.start(false, at(5)).await.unwrap();
        assert_eq!(refresh.deadline(), Some(at(15)));

        refresh.start(true, at(5)).await.unwrap();
        assert_eq!(refresh.deadline(), Some(at(20)));
    }

    #[tokio::test]
    async fn test_out_of_range_interval_is_an_error() {
        let pool = crate::db::test_pool().await;
        let mut refresh = AutoRefresh::new(pool.clone(), Duration::days(200_000_000));

        assert!(refresh.start(true, at(0)).await.is_err());
        assert_eq!(refresh.deadline(), None);
        assert_eq!(preferences::get_time(&pool, NEXT_REFRESH_TIME).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stop_and_toggle() {
        let pool = crate::db::test_pool().await;
        let mut refresh = AutoRefresh::new(pool.clone(), Duration::minutes(15));

        assert!(refresh.toggle(at(0)).await.unwrap());
        assert!(!refresh.toggle(at(1)).await.unwrap());
        assert_eq!(refresh.deadline(), None);
        assert!(!preferences::get_flag(&pool, AUTO_REFRESH_ENABLED).await.unwrap());
        assert_eq!(preferences::get_time(&pool, NEXT_REFRESH_TIME).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_init_resumes_stored_schedule() {
        let pool = crate::db::test_pool().await;
        preferences::set_flag(&pool, AUTO_REFRESH_ENABLED, true).await.unwrap();
        preferences::set_time(&pool, NEXT_REFRESH_TIME, at(10)).await.unwrap();

        let mut resumed = AutoRefresh::new(pool.clone(), Duration::minutes(15));
        resumed.init(at(2)).await.unwrap();
        assert_eq!(resumed.deadline(), Some(at(10)));

        // A stored time in the past starts a new interval
        let mut late = AutoRefresh::new(pool, Duration::minutes(15));
        late.init(at(30)).await.unwrap();
        assert_eq!(late.deadline(), Some(at(45)));
    }

    #[tokio::test]
    async fn test_init_disabled() {
        let pool = crate::db::test_pool().await;
        let mut refresh = AutoRefresh::new(pool, Duration::minutes(15));
        refresh.init(at(0)).await.unwrap();
        assert_eq!(refresh.deadline(), None);
    }
}
