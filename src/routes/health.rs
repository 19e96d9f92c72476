// src/routes/health.rs
//! Liveness endpoint for the telemetry service.
//!
//! Sibling module in the `routes` directory: it exports only a sub-router
//! that the gateway (`mod.rs`) merges into the top-level API router.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Handle `GET /health`.
///
/// Does not run the pipeline or touch the upstream fixture source.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges with the gateway
/// router whatever the state type is.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
