//! Route gateway: each sibling module exports one sub-router, merged here.

use axum::Router;

use crate::Config;

mod batch;
mod error;
mod fixture;
mod health;
mod reading;
mod transform;

pub use error::ApiError;

// ---

pub fn router(config: Config) -> Router {
    // ---
    Router::new()
        .merge(batch::router())
        .merge(reading::router())
        .merge(transform::router())
        .merge(fixture::router())
        .merge(health::router())
        .with_state(config)
}
