use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response of `data/v2/histoday` and `data/v2/histohour`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoResponse {
    #[serde(rename = "Data")]
    pub data: HistoData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoData {
    #[serde(rename = "Data")]
    pub data: Vec<HistoBar>,
}

/// One OHLC bar; only the close is charted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoBar {
    /// Unix seconds
    pub time: i64,
    pub close: f64,
}

/// Response of `data/pricemultifull`, keyed by symbol then quote currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceMultiFullResponse {
    #[serde(rename = "RAW")]
    pub raw: HashMap<String, HashMap<String, RawQuote>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct RawQuote {
    pub price: f64,
    #[serde(rename = "CHANGEPCT24HOUR")]
    pub change_pct_24_hour: Option<f64>,
    #[serde(rename = "TOTALVOLUME24HTO")]
    pub total_volume_24h_to: Option<f64>,
}
