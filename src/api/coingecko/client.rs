use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use crate::api::client::PriceFetcher;
use crate::api::models::ApiError;
use crate::models::Resolution;
use crate::utils::RateLimiter;

/// CoinGecko v3 client
pub struct CoinGeckoClient {
    base_url: String,
    limiter: RateLimiter,
}

impl CoinGeckoClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com/api/v3";

    /// Client against `base_url`, normally [`Self::DEFAULT_BASE_URL`]
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new("CoinGecko", 30, Duration::from_secs(60)),
        }
    }

    pub fn snapshot_url(&self, coin_id: &str) -> String {
        format!(
            "{}/coins/{}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false&sparkline=false",
            self.base_url, coin_id
        )
    }

    /// The day view asks for two days so the last 24 hours are fully covered
    pub fn history_url(&self, coin_id: &str, resolution: Resolution, max_days: u32) -> String {
        let days = match resolution {
            Resolution::Day => 2,
            other => other.config().days.min(max_days),
        };
        format!("{}/coins/{}/market_chart?vs_currency=usd&days={}", self.base_url, coin_id, days)
    }

    /// GET coins/{id}; the payload must carry `market_data.current_price`
    pub async fn fetch_snapshot(
        &self,
        fetcher: &dyn PriceFetcher,
        symbol: &str,
        coin_id: &str,
    ) -> Result<Value, ApiError> {
        self.limiter.acquire().await;
        info!("Fetching data for {} from CoinGecko", symbol);

        let data = fetcher.fetch_json(&self.snapshot_url(coin_id), &[]).await?;
        if data.pointer("/market_data/current_price").is_none() {
            error!("Invalid data structure received for {}", symbol);
            return Err(ApiError::InvalidShape(symbol.to_string()));
        }
        Ok(data)
    }

    /// GET coins/{id}/market_chart
    pub async fn fetch_history(
        &self,
        fetcher: &dyn PriceFetcher,
        symbol: &str,
        coin_id: &str,
        resolution: Resolution,
        max_days: u32,
    ) -> Result<Value, ApiError> {
        self.limiter.acquire().await;
        info!("Fetching historical data for {} ({}) from CoinGecko", symbol, resolution);
        fetcher.fetch_json(&self.history_url(coin_id, resolution, max_days), &[]).await
    }
}
