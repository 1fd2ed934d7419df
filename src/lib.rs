//! Oil Price Tracker - crude oil quote scraper with trend forecasting
//!
//! Polls a commodity quote page on a fixed interval, appends every reading
//! to a CSV log, keeps a bounded window of recent readings in memory, fits a
//! linear trend over that window and serves the results to a dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod forecast;
pub mod history;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod storage;

use anyhow::Context;
use api::{ApiServer, ApiState};
use config::AppConfig;
use scheduler::IngestionLoop;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize and run the tracker until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oil_price_tracker=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Oil Price Tracker...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let addr = config.bind_addr()?;

    let app_state = Arc::new(AppState::new(config).context("Failed to initialize state")?);
    tracing::info!("Application state initialized");

    let ingestion = IngestionLoop::new(app_state.clone()).spawn();

    let api_state = Arc::new(ApiState::new(app_state.clone(), ingestion.trigger()));
    let mut server = ApiServer::new(api_state);
    server
        .start(addr)
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to start API server")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutdown requested");
    server.stop();
    ingestion.shutdown().await;
    tracing::info!("Oil Price Tracker stopped");

    Ok(())
}
