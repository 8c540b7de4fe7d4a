//! Series normalizer: vendor history payloads to an ordered chart series
//!
//! Both vendors' shapes end up as `PricePoint`s sorted by time. CoinGecko
//! returns hourly samples whatever the span, so its series is either
//! decimated to roughly one point a day or resampled onto the last 24
//! wall-clock hours. Nothing here fails outward: a bad payload yields an
//! empty series and a log line.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::api::coingecko::models::MarketChartResponse;
use crate::api::cryptocompare::models::HistoResponse;
use crate::models::{CoinDescriptor, PricePoint, Resolution, Vendor};

/// Keep one CoinGecko sample in this many for the daily views
pub const DAILY_DECIMATION_STEP: usize = 24;

const HOURLY_SLOTS: i64 = 24;

/// Normalize a raw history payload for `coin` at `resolution`
pub fn normalize(coin: &CoinDescriptor, resolution: Resolution, payload: &Value) -> Vec<PricePoint> {
    normalize_at(coin, resolution, payload, Utc::now())
}

/// Same as [`normalize`] with the hourly slots anchored at `now`
pub fn normalize_at(
    coin: &CoinDescriptor,
    resolution: Resolution,
    payload: &Value,
    now: DateTime<Utc>,
) -> Vec<PricePoint> {
    if !payload.is_object() {
        error!("Invalid data received for {}: not an object", coin.symbol);
        return Vec::new();
    }
    if let Some(reason) = payload_error(payload) {
        error!("Invalid data received for {}: {}", coin.symbol, reason);
        return Vec::new();
    }

    let mut points = match coin.vendor.parse_history(payload) {
        Ok(points) => points,
        Err(e) => {
            error!("Error preparing chart data for {}: {}", coin.symbol, e);
            return Vec::new();
        }
    };
    points.sort_by_key(|p| p.timestamp);

    if let Vendor::CoinGecko { .. } = coin.vendor {
        points = match resolution {
            Resolution::Day => ensure_hourly_data_at(&points, now),
            Resolution::Week | Resolution::Month => decimate(&points, DAILY_DECIMATION_STEP),
        };
    }

    let expected = resolution.expected_points();
    if points.len() < expected {
        warn!(
            "Insufficient data points for {}. Expected {}, got {}",
            coin.symbol,
            expected,
            points.len()
        );
    }

    debug!("Prepared {} points for {} ({})", points.len(), coin.symbol, resolution);
    points
}

/// Error text carried by the payload itself, if any
fn payload_error(payload: &Value) -> Option<String> {
    for field in ["error", "Error"] {
        if let Some(v) = payload.get(field) {
            if !v.is_null() {
                return Some(v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()));
            }
        }
    }

    // CryptoCompare reports failures as {"Response": "Error", "Message": ...}
    if payload.get("Response").and_then(Value::as_str) == Some("Error") {
        let message = payload
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or("vendor reported an error");
        return Some(message.to_string());
    }

    None
}

/// `{"prices": [[ms, usd], ...]}`
pub fn parse_coingecko_history(payload: &Value) -> Result<Vec<PricePoint>, String> {
    let chart = MarketChartResponse::deserialize(payload)
        .map_err(|e| format!("Invalid CoinGecko data structure: {}", e))?;

    chart
        .prices
        .into_iter()
        .map(|sample| {
            let timestamp = Utc
                .timestamp_millis_opt(sample.0 as i64)
                .single()
                .ok_or_else(|| format!("Invalid CoinGecko timestamp: {}", sample.0))?;
            Ok(PricePoint::new(timestamp, sample.1))
        })
        .collect()
}

/// `{"Data": {"Data": [{"time": secs, "close": usd, ...}, ...]}}`
pub fn parse_cryptocompare_history(payload: &Value) -> Result<Vec<PricePoint>, String> {
    let histo = HistoResponse::deserialize(payload)
        .map_err(|e| format!("Invalid CryptoCompare data structure: {}", e))?;

    histo
        .data
        .data
        .into_iter()
        .map(|bar| {
            let timestamp = Utc
                .timestamp_opt(bar.time, 0)
                .single()
                .ok_or_else(|| format!("Invalid CryptoCompare timestamp: {}", bar.time))?;
            Ok(PricePoint::new(timestamp, bar.close))
        })
        .collect()
}

/// Keep every `step`th point, starting with the first
pub fn decimate(points: &[PricePoint], step: usize) -> Vec<PricePoint> {
    points.iter().step_by(step.max(1)).copied().collect()
}

/// One point per hour for the 24 hours before `now`, each taking the price of
/// the nearest input sample. Ties go to the earlier sample in the input.
pub fn ensure_hourly_data_at(points: &[PricePoint], now: DateTime<Utc>) -> Vec<PricePoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let start = now - Duration::hours(HOURLY_SLOTS);
    (0..HOURLY_SLOTS)
        .map(|i| {
            let target = start + Duration::hours(i);
            let distance = |p: &PricePoint| (p.timestamp - target).num_milliseconds().abs();
            let closest = points
                .iter()
                .fold(&points[0], |best, p| if distance(p) < distance(best) { p } else { best });
            PricePoint::new(target, closest.price)
        })
        .collect()
}
