// =============================================================================
// Portfolio Pulse — Main Entry Point
// =============================================================================
//
// Serves the portfolio dashboard: holdings, price alerts, a simulated live
// price stream and candlestick charts with SMA / RSI / MACD overlays.
// Streaming starts Idle; clients start it via `POST /api/v1/stream/start`.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod chart;
mod indicators;
mod market_data;
mod portfolio;
mod price_feed;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::{AppState, DashboardEvent};
use crate::market_data::HistoryClient;
use crate::runtime_config::{RuntimeConfig, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Portfolio Pulse — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load_or_default(DEFAULT_CONFIG_PATH)?;
    config.apply_overrides(|key| std::env::var(key).ok());

    info!(
        user_id = %config.user_id,
        default_symbol = %config.default_symbol,
        sma_period = config.indicators.sma_period,
        rsi_period = config.indicators.rsi_period,
        "Dashboard configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let history = HistoryClient::new(
        config.history_url.clone(),
        config.history_days,
        config.mock_fallback,
    )?;
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, history));

    // ── 3. Chart the default symbol ──────────────────────────────────────
    let chart_state = state.clone();
    tokio::spawn(async move {
        let symbol = chart_state.runtime_config.default_symbol.clone();
        match chart_state.history.fetch(&symbol).await {
            Ok(candles) => {
                if let Err(e) =
                    chart_state.dispatch(DashboardEvent::SymbolSelected { symbol, candles })
                {
                    warn!(error = %e, "Initial chart rejected");
                }
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "Initial chart unavailable"),
        }
    });

    // ── 4. Price simulator ───────────────────────────────────────────────
    tokio::spawn(price_feed::run_price_simulator(state.clone()));

    // ── 5. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    info!("Portfolio Pulse shut down complete.");
    Ok(())
}
