//! Coin catalogue and vendor dispatch

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde_json::Value;

use super::chart::PricePoint;
use super::resolution::Resolution;
use crate::services::normalizer::{parse_coingecko_history, parse_cryptocompare_history};

/// Turns a vendor's raw history payload into unsorted price points
pub type HistoryParser = fn(&Value) -> Result<Vec<PricePoint>, String>;

/// Upstream provider of a coin's prices, carrying the parser for its history shape
#[derive(Clone, Copy)]
pub enum Vendor {
    CoinGecko {
        coin_id: &'static str,
        parse_history: HistoryParser,
    },
    CryptoCompare {
        parse_history: HistoryParser,
    },
}

impl Vendor {
    pub const fn coingecko(coin_id: &'static str) -> Self {
        Vendor::CoinGecko { coin_id, parse_history: parse_coingecko_history }
    }

    pub const fn cryptocompare() -> Self {
        Vendor::CryptoCompare { parse_history: parse_cryptocompare_history }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Vendor::CoinGecko { .. } => "CoinGecko",
            Vendor::CryptoCompare { .. } => "CryptoCompare",
        }
    }

    pub fn parse_history(&self, payload: &Value) -> Result<Vec<PricePoint>, String> {
        match self {
            Vendor::CoinGecko { parse_history, .. } => parse_history(payload),
            Vendor::CryptoCompare { parse_history } => parse_history(payload),
        }
    }
}

impl fmt::Debug for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::CoinGecko { coin_id, .. } => write!(f, "CoinGecko({})", coin_id),
            Vendor::CryptoCompare { .. } => f.write_str("CryptoCompare"),
        }
    }
}

/// Static description of a tracked coin
#[derive(Debug, Clone, Copy)]
pub struct CoinDescriptor {
    pub symbol: &'static str,
    pub vendor: Vendor,
    /// Upper bound on the days of daily history requested
    pub historical_days: u32,
    /// Only hourly history exists upstream, so only the day view is offered
    pub hourly_only: bool,
    /// Fixed decimals for chart labels instead of the magnitude-based rule
    pub price_decimals: Option<usize>,
}

impl CoinDescriptor {
    const fn cryptocompare(symbol: &'static str) -> Self {
        Self {
            symbol,
            vendor: Vendor::cryptocompare(),
            historical_days: 30,
            hourly_only: false,
            price_decimals: None,
        }
    }

    pub fn allows_resolution(&self, resolution: Resolution) -> bool {
        !self.hourly_only || resolution == Resolution::Day
    }

    /// Resolution the chart switches to when this coin is selected
    pub fn resolution_on_select(&self, current: Resolution) -> Resolution {
        if self.allows_resolution(current) {
            current
        } else {
            Resolution::Day
        }
    }
}

/// Board order of the tracked coins
pub const COINS: &[CoinDescriptor] = &[
    CoinDescriptor::cryptocompare("BTC"),
    CoinDescriptor::cryptocompare("XMR"),
    CoinDescriptor::cryptocompare("PART"),
    CoinDescriptor::cryptocompare("PIVX"),
    CoinDescriptor::cryptocompare("FIRO"),
    CoinDescriptor::cryptocompare("DASH"),
    CoinDescriptor::cryptocompare("LTC"),
    CoinDescriptor::cryptocompare("DOGE"),
    CoinDescriptor::cryptocompare("ETH"),
    CoinDescriptor::cryptocompare("DCR"),
    CoinDescriptor::cryptocompare("ZANO"),
    CoinDescriptor {
        symbol: "WOW",
        vendor: Vendor::coingecko("wownero"),
        historical_days: 30,
        hourly_only: true,
        price_decimals: Some(4),
    },
    CoinDescriptor::cryptocompare("BCH"),
];

lazy_static! {
    static ref COIN_INDEX: HashMap<&'static str, &'static CoinDescriptor> =
        COINS.iter().map(|c| (c.symbol, c)).collect();
}

/// Look up a coin by symbol (case-insensitive)
pub fn find_coin(symbol: &str) -> Option<&'static CoinDescriptor> {
    COIN_INDEX.get(symbol.trim().to_uppercase().as_str()).copied()
}
