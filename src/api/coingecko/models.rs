use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response of `coins/{id}/market_chart`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<MarketChartPoint>,
}

/// `[unix_millis, price_usd]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketChartPoint(pub f64, pub f64);

/// The part of `coins/{id}` the board reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinResponse {
    pub market_data: MarketData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    /// Keyed by lowercase quote currency ("usd", "btc", ...)
    pub current_price: HashMap<String, f64>,
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
}
