use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod db;
mod models;
mod services;
mod session;
mod utils;

use api::{CoinGeckoClient, CryptoCompareClient, HttpFetcher, PriceApi, PriceFetcher};
use commands::{ControlTable, Flow, MANIFEST};
use config::Config;
use session::Session;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("pricechart=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap()))
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    info!("📈 Starting pricechart v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();

    let fetcher = match &config.proxy_url {
        Some(endpoint) => {
            info!("Routing vendor requests through {}", endpoint);
            HttpFetcher::via_proxy(endpoint.clone())
        }
        None => HttpFetcher::direct(),
    };
    let fetcher: Arc<dyn PriceFetcher> = match fetcher {
        Ok(f) => Arc::new(f),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return;
        }
    };

    let api = PriceApi::new(
        fetcher,
        CoinGeckoClient::with_base_url(config.coingecko_base_url.clone()),
        CryptoCompareClient::with_base_url(
            config.cryptocompare_api_key.clone(),
            config.cryptocompare_base_url.clone(),
        ),
    );

    // Initialize database
    info!("Initializing database...");
    let pool = match db::init_db(&config.database_url).await {
        Ok(p) => {
            info!("Database initialized successfully");
            p
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let mut session = Session::init(&config, pool, api).await;
    let controls = ControlTable::from_manifest(MANIFEST);

    session.load_initial().await;
    println!("{}", session.render(Utc::now()));
    println!("Type `help` to list controls.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = session.auto_refresh_deadline();
        let auto_refresh = async move {
            match deadline {
                Some(at) => tokio::time::sleep((at - Utc::now()).to_std().unwrap_or_default()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                };

                match controls.dispatch(&mut session, &line).await {
                    Ok(Flow::Render) => println!("{}", session.render(Utc::now())),
                    Ok(Flow::Message(message)) => {
                        if !message.is_empty() {
                            println!("{}", message);
                        }
                    }
                    Ok(Flow::Quit) => break,
                    Err(e) => {
                        error!("❌ Error executing control {}: {}", line.trim(), e);
                        println!("❌ {}", utils::extract_clean_error(&e));
                    }
                }
            }
            _ = auto_refresh => {
                // Reschedule only once the triggered refresh completes
                session.run_auto_refresh().await;
                println!("{}", session.render(Utc::now()));
            }
        }
    }

    session.teardown().await;
    info!("👋 Bye");
}
