//! `GET /api/telemetry/fixture`: pull a demo batch from the upstream
//! fixture source and run it through the pipeline.
//!
//! The upstream API is paged: each page carries its records under
//! `results` and a `next_cursor` until the last page.

use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::Value;
use tracing::{debug, info};

use super::error::ApiError;
use crate::{BatchReport, Config, Pipeline};

// ---

pub fn router() -> Router<Config> {
    // ---
    Router::new().route("/api/telemetry/fixture", get(handler))
}

async fn handler(State(config): State<Config>) -> Result<Json<BatchReport>, ApiError> {
    // ---
    info!("GET /api/telemetry/fixture - Starting pipeline");

    let api_url = config
        .sensor_api_url
        .as_deref()
        .ok_or(ApiError::NotConfigured("SENSOR_API_URL"))?;

    let records = fetch_fixture_batch(api_url, config.api_max_pages)
        .await
        .map_err(ApiError::Upstream)?;

    let report = Pipeline::new(config.pipeline_options()).run(&records)?;
    info!(
        "Fixture pipeline complete, {} records in, {} alerts",
        report.daily_summary.total_records,
        report.alerts.len()
    );
    Ok(Json(report))
}

/// Fetch every page from the fixture source, up to `max_pages`.
///
/// Records are returned untouched; validation is the pipeline's job.
async fn fetch_fixture_batch(base_url: &str, max_pages: u32) -> anyhow::Result<Vec<Value>> {
    // ---
    let client = reqwest::Client::new();
    let mut all_data = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0;

    loop {
        if page_count >= max_pages {
            debug!(
                "Hit page limit of {}, stopping pagination. Fetched {} records so far.",
                max_pages,
                all_data.len()
            );
            break;
        }
        page_count += 1;

        let request = match cursor {
            Some(ref cursor) => client.get(base_url).query(&[("cursor", cursor)]),
            None => client.get(base_url),
        };

        debug!("Fetching page {} from: {}", page_count, base_url);

        let response: Value = request
            .send()
            .await
            .with_context(|| format!("request for page {page_count} failed"))?
            .error_for_status()
            .with_context(|| format!("page {page_count} returned an error status"))?
            .json()
            .await
            .with_context(|| format!("page {page_count} is not valid JSON"))?;

        match response.get("results").and_then(|d| d.as_array()) {
            Some(data) => {
                debug!("Page {} found {} records", page_count, data.len());
                all_data.extend(data.iter().cloned());
            }
            None => debug!(
                "Page {} response missing 'results' field or not an array",
                page_count
            ),
        }

        cursor = next_cursor(&response);
        if cursor.is_none() {
            break;
        }
    }

    info!(
        "Finished fetching {} total records from {} pages",
        all_data.len(),
        page_count
    );
    Ok(all_data)
}

fn next_cursor(page: &Value) -> Option<String> {
    // ---
    page.get("next_cursor")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_cursor() {
        // ---
        assert_eq!(next_cursor(&json!({"next_cursor": "abc"})), Some("abc".to_string()));
        assert_eq!(next_cursor(&json!({"next_cursor": ""})), None);
        assert_eq!(next_cursor(&json!({"next_cursor": null})), None);
        assert_eq!(next_cursor(&json!({"results": []})), None);
    }
}
