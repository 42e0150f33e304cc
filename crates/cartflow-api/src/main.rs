//! Cartflow API server entry point.

use cartflow_api::config::AppConfig;
use cartflow_api::error::AppError;
use cartflow_api::state::AppState;
use cartflow_api::telemetry;
use tracing::{info, warn};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    info!(backend = %config.backend, "starting Cartflow API server");

    let state = AppState::from_config(&config).await?;
    let app = cartflow_api::app(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}
