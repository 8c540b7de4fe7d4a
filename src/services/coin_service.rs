use chrono::Duration;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::api::coingecko::models::CoinResponse;
use crate::api::cryptocompare::models::PriceMultiFullResponse;
use crate::api::PriceApi;
use crate::models::{CoinDescriptor, CoinSnapshot, Vendor, COINS};
use crate::services::cache_service::{coin_data_key, FreshnessCache};

/// Outcome of loading one coin's board row
#[derive(Debug, Clone)]
pub struct CoinLoad {
    pub symbol: &'static str,
    pub snapshot: Result<CoinSnapshot, String>,
    /// Time left on the cache entry when the row came from cache
    pub cached_remaining: Option<Duration>,
}

/// Snapshot for one coin, from cache when fresh, otherwise fetched and cached
pub async fn load_coin_data(cache: &FreshnessCache, api: &PriceApi, coin: &'static CoinDescriptor) -> CoinLoad {
    let key = coin_data_key(coin.symbol);

    if let Some(hit) = cache.get(&key).await {
        debug!("Using cached data for {}", coin.symbol);
        return CoinLoad {
            symbol: coin.symbol,
            snapshot: parse_snapshot(coin, &hit.value),
            cached_remaining: Some(hit.remaining),
        };
    }

    let snapshot = match api.fetch_snapshot(coin).await {
        Ok(data) => {
            cache.set(&key, &data, None).await;
            parse_snapshot(coin, &data)
        }
        Err(e) => {
            error!("Error fetching {} data: {}", coin.symbol, e);
            Err(e.to_string())
        }
    };

    if let Err(e) = &snapshot {
        error!("Error displaying data for {}: {}", coin.symbol, e);
    }

    CoinLoad {
        symbol: coin.symbol,
        snapshot,
        cached_remaining: None,
    }
}

/// Every coin in board order, one request at a time
pub async fn load_all_coins(cache: &FreshnessCache, api: &PriceApi) -> Vec<CoinLoad> {
    let mut loads = Vec::with_capacity(COINS.len());
    for coin in COINS {
        loads.push(load_coin_data(cache, api, coin).await);
    }
    loads
}

/// Current BTC price in USD, or 0 when it cannot be fetched
pub async fn update_btc_price(api: &PriceApi) -> f64 {
    let price = match api.fetch_ticker("BTC").await {
        Ok(data) => match data.pointer("/RAW/BTC/USD/PRICE").and_then(Value::as_f64) {
            Some(price) => price,
            None => {
                error!("Unexpected BTC data structure: {}", data);
                0.0
            }
        },
        Err(e) => {
            error!("Error fetching BTC price: {}", e);
            0.0
        }
    };

    debug!("Current BTC price: {}", price);
    price
}

/// Read the board figures out of a vendor's live payload
pub fn parse_snapshot(coin: &CoinDescriptor, payload: &Value) -> Result<CoinSnapshot, String> {
    if let Some(err) = payload.get("error").and_then(Value::as_str) {
        return Err(err.to_string());
    }

    let snapshot = match coin.vendor {
        Vendor::CoinGecko { .. } => {
            let response = CoinResponse::deserialize(payload)
                .map_err(|e| format!("Invalid CoinGecko data structure for {}: {}", coin.symbol, e))?;
            let market = response.market_data;
            CoinSnapshot {
                price_usd: market.current_price.get("usd").copied().unwrap_or(f64::NAN),
                price_btc: market.current_price.get("btc").copied().unwrap_or(f64::NAN),
                change_24h_pct: market.price_change_percentage_24h,
                volume_24h_usd: market.total_volume.get("usd").copied().unwrap_or(f64::NAN),
            }
        }
        Vendor::CryptoCompare { .. } => {
            let response = PriceMultiFullResponse::deserialize(payload)
                .map_err(|e| format!("Invalid CryptoCompare data structure for {}: {}", coin.symbol, e))?;
            let quotes = response
                .raw
                .get(coin.symbol)
                .ok_or_else(|| format!("Invalid CryptoCompare data structure for {}", coin.symbol))?;
            let usd = quotes
                .get("USD")
                .ok_or_else(|| format!("Invalid CryptoCompare data structure for {}", coin.symbol))?;
            let price_btc = match quotes.get("BTC") {
                Some(btc) => btc.price,
                None if coin.symbol == "BTC" => 1.0,
                None => f64::NAN,
            };
            CoinSnapshot {
                price_usd: usd.price,
                price_btc,
                change_24h_pct: usd.change_pct_24_hour,
                volume_24h_usd: usd.total_volume_24h_to.unwrap_or(f64::NAN),
            }
        }
    };

    if !snapshot.price_usd.is_finite() || !snapshot.price_btc.is_finite() || !snapshot.volume_24h_usd.is_finite() {
        return Err(format!("Invalid numeric values in data for {}", coin.symbol));
    }

    Ok(snapshot)
}
