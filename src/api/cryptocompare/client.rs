use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::api::client::PriceFetcher;
use crate::api::models::ApiError;
use crate::models::Resolution;
use crate::utils::RateLimiter;

/// Headers the ticker endpoint expects from a browser
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    ),
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    ("Accept-Language", "en-US,en;q=0.5"),
];

/// CryptoCompare min-api client
pub struct CryptoCompareClient {
    api_key: Option<String>,
    base_url: String,
    limiter: RateLimiter,
}

impl CryptoCompareClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://min-api.cryptocompare.com";

    /// Client against `base_url`, normally [`Self::DEFAULT_BASE_URL`]
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new("CryptoCompare", 50, Duration::from_secs(1)),
        }
    }

    fn api_key_param(&self) -> String {
        match &self.api_key {
            Some(key) if !key.is_empty() => format!("&api_key={}", key),
            _ => String::new(),
        }
    }

    /// Multi-symbol ticker quoting USD and BTC
    pub fn snapshot_url(&self, symbol: &str) -> String {
        format!(
            "{}/data/pricemultifull?fsyms={}&tsyms=USD,BTC{}",
            self.base_url,
            symbol,
            self.api_key_param()
        )
    }

    /// Hourly bars for the day view, otherwise daily bars capped at `max_days`
    pub fn history_url(&self, symbol: &str, resolution: Resolution, max_days: u32) -> String {
        match resolution {
            Resolution::Day => format!(
                "{}/data/v2/histohour?fsym={}&tsym=USD&limit=24{}",
                self.base_url,
                symbol,
                self.api_key_param()
            ),
            Resolution::Week | Resolution::Month => format!(
                "{}/data/v2/histoday?fsym={}&tsym=USD&limit={}&aggregate=1{}",
                self.base_url,
                symbol,
                resolution.config().days.min(max_days),
                self.api_key_param()
            ),
        }
    }

    /// GET data/pricemultifull
    pub async fn fetch_snapshot(&self, fetcher: &dyn PriceFetcher, symbol: &str) -> Result<Value, ApiError> {
        self.limiter.acquire().await;
        fetcher.fetch_json(&self.snapshot_url(symbol), BROWSER_HEADERS).await
    }

    /// GET data/v2/histohour or data/v2/histoday
    pub async fn fetch_history(
        &self,
        fetcher: &dyn PriceFetcher,
        symbol: &str,
        resolution: Resolution,
        max_days: u32,
    ) -> Result<Value, ApiError> {
        self.limiter.acquire().await;
        info!("Fetching historical data for {} ({}) from CryptoCompare", symbol, resolution);
        fetcher.fetch_json(&self.history_url(symbol, resolution, max_days), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_url() {
        let client = CryptoCompareClient::with_base_url(Some("k3y".into()), "http://cc/".into());
        assert_eq!(
            client.snapshot_url("XMR"),
            "http://cc/data/pricemultifull?fsyms=XMR&tsyms=USD,BTC&api_key=k3y"
        );
    }

    #[test]
    fn test_history_urls() {
        let client = CryptoCompareClient::with_base_url(None, "http://cc".into());
        assert_eq!(
            client.history_url("BTC", Resolution::Day, 30),
            "http://cc/data/v2/histohour?fsym=BTC&tsym=USD&limit=24"
        );
        assert_eq!(
            client.history_url("BTC", Resolution::Week, 30),
            "http://cc/data/v2/histoday?fsym=BTC&tsym=USD&limit=7&aggregate=1"
        );
        assert_eq!(
            client.history_url("BTC", Resolution::Month, 30),
            "http://cc/data/v2/histoday?fsym=BTC&tsym=USD&limit=30&aggregate=1"
        );
        assert_eq!(
            client.history_url("BTC", Resolution::Month, 14),
            "http://cc/data/v2/histoday?fsym=BTC&tsym=USD&limit=14&aggregate=1"
        );
    }
}
