//! `POST /api/telemetry/batch`: run one batch through the full pipeline.

use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use crate::{BatchReport, Config, Pipeline};

// ---

pub fn router() -> Router<Config> {
    // ---
    Router::new().route("/api/telemetry/batch", post(handler))
}

async fn handler(
    State(config): State<Config>,
    Json(records): Json<Vec<Value>>,
) -> Result<Json<BatchReport>, ApiError> {
    // ---
    info!("POST /api/telemetry/batch - {} records", records.len());

    let report = Pipeline::new(config.pipeline_options()).run(&records)?;
    Ok(Json(report))
}
