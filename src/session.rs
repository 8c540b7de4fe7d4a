//! Dashboard state owned by the control loop

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::{error, info, warn};

use crate::api::{self, PriceApi};
use crate::config::Config;
use crate::db::preferences::{self, LAST_REFRESHED_TIME, VOLUME_TOGGLE_STATE};
use crate::models::{CoinDescriptor, Resolution, COINS};
use crate::services::board_service::{Board, BoardRow, SortColumn, SortDirection};
use crate::services::cache_service::FreshnessCache;
use crate::services::chart_service::{self, format_point_label, ChartTarget, ChartUpdate};
use crate::services::coin_service;
use crate::services::refresh_service::AutoRefresh;
use crate::utils::format::{
    format_cache_status, format_date, format_last_refreshed, format_load_time, format_next_refresh, format_price,
};

pub struct Session {
    pool: SqlitePool,
    cache: FreshnessCache,
    api: PriceApi,
    target: ChartTarget,
    current_coin: &'static CoinDescriptor,
    resolution: Resolution,
    chart: Option<ChartUpdate>,
    board: Board,
    auto_refresh: AutoRefresh,
    last_refreshed: Option<DateTime<Utc>>,
    btc_price_usd: f64,
    error_banner: Option<String>,
}

impl Session {
    /// Build the session and restore stored preferences. Starts on BTC at the month view.
    pub async fn init(config: &Config, pool: SqlitePool, api: PriceApi) -> Self {
        let now = Utc::now();
        let cache = FreshnessCache::new(pool.clone(), config.cache_ttl);

        let show_volume = preferences::get_flag(&pool, VOLUME_TOGGLE_STATE)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to read volume preference: {}", e);
                false
            });
        let last_refreshed = preferences::get_time(&pool, LAST_REFRESHED_TIME)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to read last refreshed time: {}", e);
                None
            });

        let mut auto_refresh = AutoRefresh::new(pool.clone(), config.auto_refresh_interval);
        if let Err(e) = auto_refresh.init(now).await {
            warn!("{}", e);
        }

        Self {
            pool,
            cache,
            api,
            target: ChartTarget {
                dir: config.chart_dir.clone(),
                width: config.chart_width,
                height: config.chart_height,
            },
            current_coin: &COINS[0],
            resolution: Resolution::default(),
            chart: None,
            board: Board::new(show_volume),
            auto_refresh,
            last_refreshed,
            btc_price_usd: 0.0,
            error_banner: None,
        }
    }

    pub fn current_coin(&self) -> &'static CoinDescriptor {
        self.current_coin
    }

    #[cfg(test)]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[cfg(test)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    /// First paint: BTC reference price, every board row, then the current chart
    pub async fn load_initial(&mut self) {
        self.btc_price_usd = coin_service::update_btc_price(&self.api).await;
        self.load_board().await;
        self.refresh_chart(false).await;
    }

    async fn load_board(&mut self) {
        for load in coin_service::load_all_coins(&self.cache, &self.api).await {
            self.board.upsert(BoardRow::from(load));
        }
    }

    /// Drop every cached response and reload everything from upstream
    pub async fn refresh_all_data(&mut self) {
        info!("Refreshing all data...");
        let cleared = self.cache.clear().await;
        info!("Cleared {} cache entries", cleared);

        self.btc_price_usd = coin_service::update_btc_price(&self.api).await;
        self.load_board().await;
        self.refresh_chart(true).await;

        let now = Utc::now();
        self.last_refreshed = Some(now);
        if let Err(e) = preferences::set_time(&self.pool, LAST_REFRESHED_TIME, now).await {
            warn!("Failed to store last refreshed time: {}", e);
        }
        info!("✓ All data refreshed");
    }

    /// Run the due auto-refresh, then schedule the next one
    pub async fn run_auto_refresh(&mut self) {
        info!("Auto-refresh triggered");
        self.refresh_all_data().await;
        if let Err(e) = self.auto_refresh.start(true, Utc::now()).await {
            error!("{}", e);
        }
    }

    pub fn auto_refresh_deadline(&self) -> Option<DateTime<Utc>> {
        self.auto_refresh.deadline()
    }

    /// Reload the chart for the current coin and resolution. Failures go to the error banner.
    pub async fn refresh_chart(&mut self, force_refresh: bool) {
        match chart_service::update_chart(
            &self.cache,
            &self.api,
            self.current_coin,
            self.resolution,
            force_refresh,
            &self.target,
        )
        .await
        {
            Ok(update) => self.chart = Some(update),
            Err(e) => {
                error!("{}", e);
                self.chart = None;
                self.error_banner = Some(e);
            }
        }
    }

    pub async fn select_coin(&mut self, symbol: &str) -> Result<(), String> {
        let coin = api::lookup_coin(symbol).map_err(|e| e.to_string())?;

        self.current_coin = coin;
        self.resolution = coin.resolution_on_select(self.resolution);
        info!("Selected {} ({})", coin.symbol, self.resolution);
        self.refresh_chart(false).await;
        Ok(())
    }

    /// Switch the chart resolution. Returns false when the coin does not offer it.
    pub async fn select_resolution(&mut self, resolution: Resolution) -> bool {
        if !self.current_coin.allows_resolution(resolution) {
            info!("{} only offers the {} view", self.current_coin.symbol, Resolution::Day);
            return false;
        }

        self.resolution = resolution;
        self.refresh_chart(false).await;
        true
    }

    pub async fn toggle_volume(&mut self) -> bool {
        let show = !self.board.show_volume();
        self.board.set_show_volume(show);
        if let Err(e) = preferences::set_flag(&self.pool, VOLUME_TOGGLE_STATE, show).await {
            warn!("Failed to store volume preference: {}", e);
        }
        show
    }

    pub async fn toggle_auto_refresh(&mut self) -> Result<bool, String> {
        self.auto_refresh.toggle(Utc::now()).await
    }

    pub fn sort_board(&mut self, column: SortColumn) -> SortDirection {
        self.board.sort_by(column)
    }

    pub fn close_error(&mut self) {
        self.error_banner = None;
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        let mut out = String::new();

        if let Some(banner) = &self.error_banner {
            out.push_str(&format!("⚠️  {}  (close-error to dismiss)\n\n", banner));
        }

        out.push_str(&format!("BTC: $ {}\n\n", format_price(self.btc_price_usd)));
        out.push_str(&self.board.render());
        out.push('\n');
        out.push_str(&self.render_chart());

        out.push_str(&format_next_refresh(self.auto_refresh.deadline(), now));
        out.push('\n');
        if let Some(last) = format_last_refreshed(self.last_refreshed) {
            out.push_str(&last);
            out.push('\n');
        }
        out
    }

    fn render_chart(&self) -> String {
        let coin = self.current_coin;
        let mut out = format!("{} ({}) from {}\n", coin.symbol, self.resolution, coin.vendor.name());

        let chart = match &self.chart {
            Some(chart) => chart,
            None => {
                out.push_str("No chart data\n\n");
                return out;
            }
        };

        match &chart.image_path {
            Some(path) => out.push_str(&format!("Chart: {} ({} points)\n", path.display(), chart.points.len())),
            None => out.push_str(&format!("Not enough data to draw a chart ({} points)\n", chart.points.len())),
        }
        if let (Some(first), Some(last)) = (chart.points.first(), chart.points.last()) {
            out.push_str(&format!(
                "{} .. {}\n{}\n",
                format_date(first.timestamp, chart.resolution),
                format_date(last.timestamp, chart.resolution),
                format_point_label(coin, last)
            ));
        }
        out.push_str(&format!(
            "{} | {}\n\n",
            format_load_time(chart.load_time),
            format_cache_status(chart.cached_remaining)
        ));
        out
    }

    /// Persist scalar state and close the store
    pub async fn teardown(self) {
        if let Err(e) = preferences::set_flag(&self.pool, VOLUME_TOGGLE_STATE, self.board.show_volume()).await {
            warn!("Failed to store volume preference: {}", e);
        }
        if let Some(last) = self.last_refreshed {
            if let Err(e) = preferences::set_time(&self.pool, LAST_REFRESHED_TIME, last).await {
                warn!("Failed to store last refreshed time: {}", e);
            }
        }
        self.pool.close().await;
        info!("Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockFetcher;
    use crate::api::{CoinGeckoClient, CryptoCompareClient};
    use serde_json::json;
    use std::sync::Arc;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "PRICECHART_CHART_DIR" => Some(std::env::temp_dir().join("pricechart-session").display().to_string()),
            _ => None,
        })
    }

    async fn session(fetcher: Arc<MockFetcher>) -> Session {
        let api = PriceApi::new(
            fetcher,
            CoinGeckoClient::with_base_url("http://cg".into()),
            CryptoCompareClient::with_base_url(None, "http://cc".into()),
        );
        Session::init(&test_config(), crate::db::test_pool().await, api).await
    }

    #[tokio::test]
    async fn test_selecting_wow_forces_day() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("market_chart", Ok(json!({"prices": []})));
        let mut session = session(fetcher).await;
        assert_eq!(session.resolution(), Resolution::Month);

        session.select_coin("wow").await.unwrap();
        assert_eq!(session.current_coin().symbol, "WOW");
        assert_eq!(session.resolution(), Resolution::Day);

        assert!(!session.select_resolution(Resolution::Week).await);
        assert_eq!(session.resolution(), Resolution::Day);

        assert_eq!(
            session.select_coin("NOPE").await.unwrap_err(),
            "No configuration found for coin: NOPE"
        );
        assert_eq!(session.current_coin().symbol, "WOW");
    }

    #[tokio::test]
    async fn test_chart_failure_sets_banner() {
        let mut session = session(Arc::new(MockFetcher::new())).await;
        session.refresh_chart(false).await;

        let banner = session.error_banner().unwrap().to_string();
        assert!(banner.starts_with("Failed to update chart for BTC: Network error"));
        assert!(session.render(Utc::now()).contains(&banner));

        session.close_error();
        assert!(session.error_banner().is_none());
    }

    #[tokio::test]
    async fn test_refresh_all_records_time_and_keeps_preferences() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("histoday", Ok(json!({"Data": {"Data": []}})));
        let mut session = session(fetcher).await;

        assert!(session.toggle_volume().await);
        session.refresh_all_data().await;

        assert_eq!(session.board().rows().len(), COINS.len());
        assert!(session.board().rows().iter().all(|r| r.snapshot.is_err()));
        assert!(preferences::get_flag(&session.pool, VOLUME_TOGGLE_STATE).await.unwrap());
        assert!(preferences::get_time(&session.pool, LAST_REFRESHED_TIME).await.unwrap().is_some());
        assert!(session.render(Utc::now()).contains("Last Refreshed: "));
    }
}
