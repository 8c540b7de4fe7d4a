//! Runtime settings read from the environment (and `.env` via dotenv)

use std::path::PathBuf;

use chrono::Duration;
use tracing::warn;

use crate::api::{CoinGeckoClient, CryptoCompareClient};
use crate::services::cache_service::DEFAULT_TTL_MINUTES;
use crate::services::refresh_service::DEFAULT_INTERVAL_MINUTES;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pricechart.db?mode=rwc";
pub const DEFAULT_CHART_DIR: &str = "charts";

/// Longest TTL or refresh interval accepted from the environment (one week)
pub const MAX_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub cryptocompare_api_key: Option<String>,
    pub database_url: String,
    /// POST `{url, headers}` here instead of calling vendors directly
    pub proxy_url: Option<String>,
    pub chart_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    pub cache_ttl: Duration,
    pub auto_refresh_interval: Duration,
    pub coingecko_base_url: String,
    pub cryptocompare_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            cryptocompare_api_key: non_empty("CRYPTOCOMPARE_API_KEY"),
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            proxy_url: non_empty("PRICECHART_PROXY_URL"),
            chart_dir: PathBuf::from(non_empty("PRICECHART_CHART_DIR").unwrap_or_else(|| DEFAULT_CHART_DIR.to_string())),
            chart_width: parse_or("PRICECHART_CHART_WIDTH", non_empty("PRICECHART_CHART_WIDTH"), 1200),
            chart_height: parse_or("PRICECHART_CHART_HEIGHT", non_empty("PRICECHART_CHART_HEIGHT"), 600),
            cache_ttl: Duration::minutes(minutes_or(
                "CACHE_TTL_MINUTES",
                non_empty("CACHE_TTL_MINUTES"),
                DEFAULT_TTL_MINUTES,
            )),
            auto_refresh_interval: Duration::minutes(minutes_or(
                "AUTO_REFRESH_MINUTES",
                non_empty("AUTO_REFRESH_MINUTES"),
                DEFAULT_INTERVAL_MINUTES,
            )),
            coingecko_base_url: non_empty("COINGECKO_BASE_URL")
                .unwrap_or_else(|| CoinGeckoClient::DEFAULT_BASE_URL.to_string()),
            cryptocompare_base_url: non_empty("CRYPTOCOMPARE_BASE_URL")
                .unwrap_or_else(|| CryptoCompareClient::DEFAULT_BASE_URL.to_string()),
        }
    }
}

fn parse_or(key: &str, raw: Option<String>, default: u32) -> u32 {
    match raw.map(|v| v.parse::<u32>()) {
        Some(Ok(value)) if value > 0 => value,
        Some(_) => {
            warn!("Invalid {}, using {}", key, default);
            default
        }
        None => default,
    }
}

fn minutes_or(key: &str, raw: Option<String>, default: i64) -> i64 {
    match raw.map(|v| v.parse::<i64>()) {
        Some(Ok(value)) if value > 0 && value <= MAX_MINUTES => value,
        Some(_) => {
            warn!("Invalid {} (1 to {} minutes), using {} minutes", key, MAX_MINUTES, default);
            default
        }
        None => default,
    }
}
