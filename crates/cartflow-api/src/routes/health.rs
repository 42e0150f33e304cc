//! Liveness probe for load balancers and deploy scripts.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`. Identifies the running build; says nothing about
/// the event store backing.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: &'static str,
    /// Crate name of the binary.
    pub service: &'static str,
    /// Crate version of the binary.
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `/health`, mounted at the root next to the versioned cart API.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
