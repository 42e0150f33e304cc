//! Cartflow HTTP API.
//!
//! Exposes the cart context over JSON/HTTP. The binary in `main.rs` only
//! reads configuration, installs telemetry, and serves [`app`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/carts", routes::carts::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
