// =============================================================================
// Signal Desk — Main Entry Point
// =============================================================================
//
// Backend for the crypto signal dashboard: serves indicator-annotated mock
// candle series, keeps the active signal set fresh in the background and
// relays market summaries from the hosted analysis model.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod error;
mod indicators;
mod market_data;
mod retry;
mod runtime_config;
mod signals;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::AnalysisClient;
use crate::app_state::AppState;
use crate::market_data::MockFeed;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Signal Desk starting up");

    let mut config = RuntimeConfig::load("dashboard_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        symbols = types::SYMBOLS.len(),
        poll_secs = config.signal_poll_interval_secs,
        failure_rate = config.mock_failure_rate,
        "Dashboard configured"
    );

    // ── 2. Data sources ──────────────────────────────────────────────────
    let feed = Arc::new(MockFeed::new(config.feed_config()));
    let analysis = AnalysisClient::from_env(config.analysis.clone())
        .context("failed to build analysis client")?;

    // ── 3. Build shared state ────────────────────────────────────────────
    let poll_interval = config.signal_poll_interval();
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, feed, analysis));

    // ── 4. Background signal poller ──────────────────────────────────────
    let poller = tokio::spawn(signals::run_signal_poller(state.clone(), poll_interval));

    // ── 5. Start the API server ──────────────────────────────────────────
    let app = api::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    poller.abort();
    server.abort();

    info!("Signal Desk stopped");
    Ok(())
}
