use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use tracing::{debug, error, info, warn};

use crate::api::PriceApi;
use crate::models::{CoinDescriptor, PricePoint, Resolution};
use crate::services::cache_service::{chart_data_key, FreshnessCache};
use crate::services::normalizer;
use crate::utils::chart_error_message;
use crate::utils::format::format_price;

/// History payloads stay cached this long
pub const CHART_CACHE_TTL_MINUTES: i64 = 15;

const LINE_COLOR: RGBColor = RGBColor(77, 132, 240);

/// Where the rendered chart goes and how big it is
#[derive(Debug, Clone)]
pub struct ChartTarget {
    pub dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ChartTarget {
    pub fn path_for(&self, symbol: &str, resolution: Resolution) -> PathBuf {
        self.dir.join(format!("chart_{}_{}.png", symbol, resolution))
    }
}

/// The chart currently on screen
#[derive(Debug, Clone)]
pub struct ChartUpdate {
    pub resolution: Resolution,
    pub points: Vec<PricePoint>,
    /// None when the series was too short to draw
    pub image_path: Option<PathBuf>,
    pub load_time: Duration,
    pub cached_remaining: Option<Duration>,
}

/// Load, normalize and draw a coin's history. Uses the cached payload unless `force_refresh`.
pub async fn update_chart(
    cache: &FreshnessCache,
    api: &PriceApi,
    coin: &'static CoinDescriptor,
    resolution: Resolution,
    force_refresh: bool,
    target: &ChartTarget,
) -> Result<ChartUpdate, String> {
    let started = Instant::now();
    let key = chart_data_key(coin.symbol, resolution);

    let cached = if force_refresh { None } else { cache.get(&key).await };
    let cached_remaining = cached.as_ref().map(|hit| hit.remaining);

    let data = match cached {
        Some(hit) => {
            debug!("Using cached data for {} ({})", coin.symbol, resolution);
            hit.value
        }
        None => {
            info!("Fetching fresh data for {} ({})", coin.symbol, resolution);
            let data = api.fetch_history(coin, resolution).await.map_err(|e| {
                error!("Error updating chart for {}: {}", coin.symbol, e);
                chart_error_message(coin.symbol, &e.to_string())
            })?;
            cache
                .set(&key, &data, Some(Duration::minutes(CHART_CACHE_TTL_MINUTES)))
                .await;
            data
        }
    };

    let points = normalizer::normalize(coin, resolution, &data);

    let image_path = if points.len() >= 2 {
        tokio::fs::create_dir_all(&target.dir)
            .await
            .map_err(|e| chart_error_message(coin.symbol, &format!("Failed to create {}: {}", target.dir.display(), e)))?;

        let path = target.path_for(coin.symbol, resolution);
        render_chart(coin, resolution, &points, &path, target.width, target.height)
            .map_err(|e| chart_error_message(coin.symbol, &e))?;
        info!("✓ Chart for {} ({}) written to {}", coin.symbol, resolution, path.display());
        Some(path)
    } else {
        warn!("No chart rendered for {} ({}): {} point(s)", coin.symbol, resolution, points.len());
        None
    };

    Ok(ChartUpdate {
        resolution,
        points,
        image_path,
        load_time: Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero()),
        cached_remaining,
    })
}

/// Y axis tick label
pub fn format_axis_price(coin: &CoinDescriptor, value: f64) -> String {
    match coin.price_decimals {
        Some(decimals) => format!("${:.*}", decimals, value),
        None => format!("${}", format_price(value)),
    }
}

/// X axis tick label: hour of day for the day view, calendar day otherwise
pub fn format_axis_time(timestamp: DateTime<Utc>, resolution: Resolution) -> String {
    match resolution {
        Resolution::Day => timestamp.format("%H:00").to_string(),
        Resolution::Week | Resolution::Month => timestamp.format("%b %-d").to_string(),
    }
}

/// Hover-style label for a single point
pub fn format_point_label(coin: &CoinDescriptor, point: &PricePoint) -> String {
    format!(
        "{} Price (USD): {} at {}",
        coin.symbol,
        format_axis_price(coin, point.price),
        point.timestamp.format("%b %-d, %Y %H:%M UTC")
    )
}

/// Y axis bounds with 10% padding. Only an all-non-negative series is kept above zero;
/// negative prices stay on the plot.
pub fn price_axis_range(points: &[PricePoint]) -> (f64, f64) {
    let min_price = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max_price = points.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);

    // Add some padding to the price range
    let price_range = (max_price - min_price).max(1e-8);
    let padding = price_range * 0.1;
    let y_min = if min_price >= 0.0 {
        (min_price - padding).max(0.0)
    } else {
        min_price - padding
    };
    (y_min, max_price + padding)
}

/// Draw the series as a filled line chart PNG at `path`
pub fn render_chart(
    coin: &CoinDescriptor,
    resolution: Resolution,
    points: &[PricePoint],
    path: &Path,
    width: u32,
    height: u32,
) -> Result<(), String> {
    if points.len() < 2 {
        return Err("❌ Not enough price data to generate chart (minimum 2 points required).".to_string());
    }

    let backend = BitMapBackend::new(path, (width, height));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| format!("Failed to fill canvas: {}", e))?;

    let (y_min, y_max) = price_axis_range(points);

    let x_min = points[0].timestamp;
    let mut x_max = points[points.len() - 1].timestamp;
    if x_max <= x_min {
        x_max = x_min + Duration::hours(1);
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(
            &format!("{} Price Chart", coin.symbol),
            ("sans-serif", 40.0).into_font(),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| format!("Failed to build chart: {}", e))?;

    let max_x_labels = if resolution == Resolution::Day { 24 } else { 10 };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(max_x_labels)
        .x_label_formatter(&|t: &DateTime<Utc>| format_axis_time(*t, resolution))
        .y_label_formatter(&|v: &f64| format_axis_price(coin, *v))
        .y_desc(&format!("Price (USD) - {} - {}", coin.symbol, coin.vendor.name()))
        .x_desc("Time")
        .draw()
        .map_err(|e| format!("Failed to draw mesh: {}", e))?;

    chart
        .draw_series(
            AreaSeries::new(points.iter().map(|p| (p.timestamp, p.price)), y_min, &LINE_COLOR.mix(0.1))
                .border_style(LINE_COLOR.stroke_width(3)),
        )
        .map_err(|e| format!("Failed to draw price line: {}", e))?;

    root.present()
        .map_err(|e| format!("Failed to render chart: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockFetcher;
    use crate::api::{ApiError, CoinGeckoClient, CryptoCompareClient};
    use crate::models::find_coin;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn target() -> ChartTarget {
        ChartTarget {
            dir: std::env::temp_dir().join("pricechart-tests"),
            width: 800,
            height: 600,
        }
    }

    async fn setup(fetcher: Arc<MockFetcher>) -> (FreshnessCache, PriceApi) {
        let cache = FreshnessCache::new(crate::db::test_pool().await, Duration::minutes(15));
        let api = PriceApi::new(
            fetcher,
            CoinGeckoClient::with_base_url("http://cg".into()),
            CryptoCompareClient::with_base_url(None, "http://cc".into()),
        );
        (cache, api)
    }

    #[test]
    fn test_axis_formatters() {
        let btc = find_coin("BTC").unwrap();
        let wow = find_coin("WOW").unwrap();
        assert_eq!(format_axis_price(btc, 65432.19), "$65432.2");
        assert_eq!(format_axis_price(btc, 0.5), "$0.5000");
        assert_eq!(format_axis_price(wow, 0.04123456), "$0.0412");

        let t = Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 0).unwrap();
        assert_eq!(format_axis_time(t, Resolution::Day), "07:00");
        assert_eq!(format_axis_time(t, Resolution::Month), "Mar 5");
    }

    #[test]
    fn test_point_label() {
        let btc = find_coin("BTC").unwrap();
        let point = PricePoint::new(Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 0).unwrap(), 50000.0);
        assert_eq!(
            format_point_label(btc, &point),
            "BTC Price (USD): $50000.0 at Mar 5, 2024 07:30 UTC"
        );
    }

    #[test]
    fn test_axis_range_keeps_negative_prices() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let points = [PricePoint::new(t, -5.0), PricePoint::new(t + Duration::hours(1), 15.0)];
        let (y_min, y_max) = price_axis_range(&points);
        assert!(y_min <= -5.0);
        assert!(y_max >= 15.0);

        let positive = [PricePoint::new(t, 1.0), PricePoint::new(t + Duration::hours(1), 100.0)];
        assert_eq!(price_axis_range(&positive).0, 0.0);
    }

    #[test]
    fn test_render_needs_two_points() {
        let btc = find_coin("BTC").unwrap();
        let one = [PricePoint::new(Utc::now(), 1.0)];
        let path = target().path_for("BTC", Resolution::Month);
        assert!(render_chart(btc, Resolution::Month, &one, &path, 800, 600).is_err());
    }

    #[tokio::test]
    async fn test_update_chart_uses_cache_until_forced() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond(
            "histoday?fsym=DASH",
            Ok(json!({"Data": {"Data": [{"time": 1700000000, "close": 30.5}]}})),
        );
        let (cache, api) = setup(fetcher.clone()).await;
        let dash = find_coin("DASH").unwrap();

        let first = update_chart(&cache, &api, dash, Resolution::Week, false, &target()).await.unwrap();
        assert_eq!(first.points.len(), 1);
        assert!(first.image_path.is_none());
        assert!(first.cached_remaining.is_none());

        let second = update_chart(&cache, &api, dash, Resolution::Week, false, &target()).await.unwrap();
        assert!(second.cached_remaining.is_some());
        assert_eq!(fetcher.call_count(), 1);

        update_chart(&cache, &api, dash, Resolution::Week, true, &target()).await.unwrap();
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_update_chart_reports_fetch_failure() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("histohour?fsym=ETH", Err(ApiError::Http { status: 502, message: "Bad Gateway".into() }));
        let (cache, api) = setup(fetcher).await;
        let eth = find_coin("ETH").unwrap();

        let err = update_chart(&cache, &api, eth, Resolution::Day, false, &target()).await.unwrap_err();
        assert_eq!(err, "Failed to update chart for ETH: HTTP Error: 502 Bad Gateway");
        assert!(!cache.is_valid("chartData_ETH_day").await);
    }

    #[tokio::test]
    async fn test_malformed_history_is_cached_but_draws_nothing() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("market_chart", Ok(json!({"prices": "nope"})));
        let (cache, api) = setup(fetcher).await;
        let wow = find_coin("WOW").unwrap();

        let update = update_chart(&cache, &api, wow, Resolution::Day, false, &target()).await.unwrap();
        assert!(update.points.is_empty());
        assert!(update.image_path.is_none());
    }
}
