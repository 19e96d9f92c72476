//! `POST /api/transform`: run a batch and return a single report shape.
//!
//! `transformType` picks the shape: `hourly_aggregation`,
//! `daily_summary`, `equipment_efficiency` or `fleet_kpis`. Anything else
//! gets the default envelope, which only counts the input.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use crate::{Config, Pipeline};

// ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    #[serde(default = "default_transform_type")]
    transform_type: String,
    #[serde(default)]
    data: Vec<Value>,
}

fn default_transform_type() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformResponse {
    status: &'static str,
    transform_type: String,
    result: Value,
    record_count: usize,
}

pub fn router() -> Router<Config> {
    // ---
    Router::new().route("/api/transform", post(handler))
}

async fn handler(
    State(config): State<Config>,
    Json(req): Json<TransformRequest>,
) -> Result<Json<TransformResponse>, ApiError> {
    // ---
    info!(
        "POST /api/transform - {} over {} records",
        req.transform_type,
        req.data.len()
    );

    let pipeline = Pipeline::new(config.pipeline_options());
    let (result, record_count) = match req.transform_type.as_str() {
        "hourly_aggregation" => {
            let rollup = pipeline.run(&req.data)?.hourly_rollup;
            let count = rollup.len();
            (to_json(&rollup)?, count)
        }
        "daily_summary" => (to_json(&pipeline.run(&req.data)?.daily_summary)?, 1),
        "equipment_efficiency" => {
            let ranking = pipeline.run(&req.data)?.device_efficiency_ranking;
            let count = ranking.len();
            (to_json(&ranking)?, count)
        }
        "fleet_kpis" => (to_json(&pipeline.run(&req.data)?.kpis)?, 1),
        _ => (
            json!({
                "transformationType": "default",
                "inputRecords": req.data.len(),
            }),
            1,
        ),
    };

    Ok(Json(TransformResponse {
        status: "success",
        transform_type: req.transform_type,
        result,
        record_count,
    }))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.into()))
}
