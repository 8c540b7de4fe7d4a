//! Live coin snapshot models

/// Current market figures for one coin, as shown on its board row
#[derive(Debug, Clone, PartialEq)]
pub struct CoinSnapshot {
    pub price_usd: f64,
    pub price_btc: f64,
    pub change_24h_pct: Option<f64>,
    pub volume_24h_usd: f64,
}
