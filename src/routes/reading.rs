//! `POST /api/telemetry/reading`: process a single device reading.
//!
//! This is the device-side path: the reading is validated, normalized and
//! checked against thresholds, but not aggregated.

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use crate::{Alert, Config, NormalizedReading, Pipeline};

// ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingResponse {
    status: &'static str,
    processed_data: NormalizedReading,
    alerts: Vec<Alert>,
}

pub fn router() -> Router<Config> {
    // ---
    Router::new().route("/api/telemetry/reading", post(handler))
}

async fn handler(
    State(config): State<Config>,
    Json(record): Json<Value>,
) -> Result<Json<ReadingResponse>, ApiError> {
    // ---
    let (processed_data, alerts) = Pipeline::new(config.pipeline_options()).process_reading(&record)?;
    info!(
        "POST /api/telemetry/reading - device {} processed, {} alerts",
        processed_data.device_id,
        alerts.len()
    );

    Ok(Json(ReadingResponse {
        status: "success",
        processed_data,
        alerts,
    }))
}
