pub mod client;
pub mod coingecko;
pub mod cryptocompare;
pub mod models;

#[cfg(test)]
pub mod mock;

use std::sync::Arc;

use serde_json::Value;

pub use client::{HttpFetcher, PriceFetcher};
pub use coingecko::CoinGeckoClient;
pub use cryptocompare::CryptoCompareClient;
pub use models::ApiError;

use crate::models::{find_coin, CoinDescriptor, Resolution, Vendor};

/// Both vendor clients behind one fetcher, dispatched by a coin's vendor
pub struct PriceApi {
    fetcher: Arc<dyn PriceFetcher>,
    coingecko: CoinGeckoClient,
    cryptocompare: CryptoCompareClient,
}

impl PriceApi {
    pub fn new(fetcher: Arc<dyn PriceFetcher>, coingecko: CoinGeckoClient, cryptocompare: CryptoCompareClient) -> Self {
        Self { fetcher, coingecko, cryptocompare }
    }

    /// Live snapshot payload for a coin
    pub async fn fetch_snapshot(&self, coin: &CoinDescriptor) -> Result<Value, ApiError> {
        match coin.vendor {
            Vendor::CoinGecko { coin_id, .. } => {
                self.coingecko
                    .fetch_snapshot(self.fetcher.as_ref(), coin.symbol, coin_id)
                    .await
            }
            Vendor::CryptoCompare { .. } => {
                self.cryptocompare
                    .fetch_snapshot(self.fetcher.as_ref(), coin.symbol)
                    .await
            }
        }
    }

    /// CryptoCompare ticker for any symbol; used for the BTC reference price
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Value, ApiError> {
        self.cryptocompare.fetch_snapshot(self.fetcher.as_ref(), symbol).await
    }

    /// History payload for a coin at a resolution
    pub async fn fetch_history(&self, coin: &CoinDescriptor, resolution: Resolution) -> Result<Value, ApiError> {
        match coin.vendor {
            Vendor::CoinGecko { coin_id, .. } => {
                self.coingecko
                    .fetch_history(self.fetcher.as_ref(), coin.symbol, coin_id, resolution, coin.historical_days)
                    .await
            }
            Vendor::CryptoCompare { .. } => {
                self.cryptocompare
                    .fetch_history(self.fetcher.as_ref(), coin.symbol, resolution, coin.historical_days)
                    .await
            }
        }
    }
}

/// Configured coin for a user-supplied symbol
pub fn lookup_coin(symbol: &str) -> Result<&'static CoinDescriptor, ApiError> {
    find_coin(symbol).ok_or_else(|| ApiError::UnknownCoin(symbol.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockFetcher;
    use serde_json::json;

    fn api(fetcher: Arc<MockFetcher>) -> PriceApi {
        PriceApi::new(
            fetcher,
            CoinGeckoClient::with_base_url("http://cg".into()),
            CryptoCompareClient::with_base_url(None, "http://cc".into()),
        )
    }

    #[tokio::test]
    async fn test_dispatch_by_vendor() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("market_chart", Ok(json!({"prices": []})));
        fetcher.respond("histoday", Ok(json!({"Data": {"Data": []}})));
        let api = api(fetcher.clone());

        api.fetch_history(lookup_coin("WOW").unwrap(), Resolution::Day).await.unwrap();
        api.fetch_history(lookup_coin("ltc").unwrap(), Resolution::Week).await.unwrap();

        let calls = fetcher.calls();
        assert!(calls[0].starts_with("http://cg/coins/wownero/market_chart"));
        assert!(calls[1].starts_with("http://cc/data/v2/histoday?fsym=LTC"));
    }

    #[test]
    fn test_unknown_coin() {
        let err = lookup_coin(" XYZ ").unwrap_err();
        assert_eq!(err, ApiError::UnknownCoin("XYZ".into()));
        assert_eq!(err.to_string(), "No configuration found for coin: XYZ");
    }

    #[tokio::test]
    async fn test_coingecko_snapshot_requires_market_data() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("coins/wownero?", Ok(json!({"id": "wownero"})));
        let api = api(fetcher);

        let wow = find_coin("WOW").unwrap();
        assert_eq!(api.fetch_snapshot(wow).await.unwrap_err(), ApiError::InvalidShape("WOW".into()));
    }
}
