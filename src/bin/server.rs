//! Forecast HTTP Server Binary
//!
//! This is the main entry point for the forecast REST API server.
//! It loads configuration, builds the orchestrator around the built-in
//! model, sets up the HTTP router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin forecast-server
//!
//! # With an explicit configuration file
//! FORECAST_CONFIG=/etc/forecast.toml cargo run --bin forecast-server
//! ```
//!
//! # Environment Variables
//!
//! - `FORECAST_CONFIG`: Path to a TOML configuration file
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `FORECAST_TIMEOUT_SECS`: Per-request forecast timeout (default: 60)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use forecast_service::config::ServiceConfig;
use forecast_service::http::{create_router, AppState};
use forecast_service::services::{DecomposableModel, ForecastOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting forecast HTTP server");

    let config = ServiceConfig::load()?;
    info!(
        interval_width = config.forecast.interval_width,
        timeout_secs = config.forecast.request_timeout_secs,
        max_periods = config.forecast.max_periods,
        "Configuration loaded"
    );

    let model = DecomposableModel::with_interval_width(config.forecast.interval_width)?;
    let orchestrator = ForecastOrchestrator::new(Arc::new(model));
    let state = AppState::new(orchestrator, &config);

    // Create router with all endpoints
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
