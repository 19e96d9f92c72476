//! Ingress validation.
//!
//! Turns untyped JSON records into [`RawReading`]s. The batch is rejected
//! on the first bad record; nothing is partially accepted.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::error::{PipelineError, PipelineResult};
use crate::models::RawReading;

// ---

const DEVICE_ID: &str = "deviceId";
const TIMESTAMP: &str = "timestamp";
const SENSOR_VALUES: &str = "sensorValues";

/// Field name used by the device-side processor for the same mapping.
const SENSOR_VALUES_ALIAS: &str = "sensorData";

/// Validate a whole batch, failing fast on the first offending record.
///
/// Returns [`PipelineError::EmptyInput`] for a batch with no records.
pub fn validate_batch(records: &[Value]) -> PipelineResult<Vec<RawReading>> {
    // ---
    if records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    records
        .iter()
        .enumerate()
        .map(|(index, record)| validate_record(index, record))
        .collect()
}

/// Validate one record found at `index` in its batch.
pub fn validate_record(index: usize, record: &Value) -> PipelineResult<RawReading> {
    // ---
    let obj = record
        .as_object()
        .ok_or_else(|| PipelineError::validation(index, "record", "must be a JSON object"))?;

    let device_id = require_str(index, obj, DEVICE_ID)?;
    if device_id.trim().is_empty() {
        return Err(PipelineError::validation(index, DEVICE_ID, "must not be empty"));
    }

    let raw_ts = require_str(index, obj, TIMESTAMP)?;
    let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
        PipelineError::validation(
            index,
            TIMESTAMP,
            format!("is not an ISO 8601 timestamp: {raw_ts:?}"),
        )
    })?;

    let (field, found) = sensor_values_entry(obj);
    let sensor_values = match found {
        Some(Value::Object(values)) if !values.is_empty() => values,
        Some(Value::Object(_)) => {
            return Err(PipelineError::validation(
                index,
                field,
                "must contain at least one sensor reading",
            ))
        }
        Some(_) => return Err(PipelineError::validation(index, field, "must be an object")),
        None => return Err(PipelineError::validation(index, field, "is required")),
    };

    Ok(RawReading {
        device_id: device_id.to_string(),
        timestamp,
        sensor_values: sensor_values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })
}

/// Pick the sensor mapping and the key it came from. A `null`
/// `sensorValues` counts as absent so the alias still applies.
fn sensor_values_entry(obj: &Map<String, Value>) -> (&'static str, Option<&Value>) {
    // ---
    match obj.get(SENSOR_VALUES) {
        Some(Value::Null) | None if obj.contains_key(SENSOR_VALUES_ALIAS) => {
            (SENSOR_VALUES_ALIAS, obj.get(SENSOR_VALUES_ALIAS).filter(|v| !v.is_null()))
        }
        Some(Value::Null) | None => (SENSOR_VALUES, None),
        found => (SENSOR_VALUES, found),
    }
}

fn require_str<'a>(index: usize, obj: &'a Map<String, Value>, field: &str) -> PipelineResult<&'a str> {
    // ---
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(Value::Null) | None => Err(PipelineError::validation(index, field, "is required")),
        Some(_) => Err(PipelineError::validation(index, field, "must be a string")),
    }
}

/// Parse an ISO 8601 timestamp into UTC.
///
/// Offsets are honoured; timestamps without one are taken as UTC. A space
/// separator is accepted as well as `T`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
