//! Normalizer: raw sensor values to typed, unit-tagged, status-classified values.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::{PipelineError, PipelineResult};
use super::PipelineOptions;
use crate::models::{NormalizedReading, RawReading, SensorKind, SensorStatus, SensorValue};

// ---

/// Normalize every reading of a validated batch.
pub fn normalize_batch(
    batch: &[RawReading],
    options: &PipelineOptions,
) -> PipelineResult<Vec<NormalizedReading>> {
    // ---
    batch
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_reading(index, raw, options))
        .collect()
}

/// Normalize one reading found at `index` in its batch.
///
/// Unrecognized sensor keys are dropped without looking at their values
/// unless `options.keep_unrecognized` is set, in which case they must be
/// numeric too.
pub fn normalize_reading(
    index: usize,
    raw: &RawReading,
    options: &PipelineOptions,
) -> PipelineResult<NormalizedReading> {
    // ---
    let mut sensor_data = BTreeMap::new();
    let mut other = BTreeMap::new();

    for (key, raw_value) in &raw.sensor_values {
        match SensorKind::from_key(key) {
            Some(kind) => {
                let value = coerce(index, key, raw_value)?;
                sensor_data.insert(
                    kind,
                    SensorValue {
                        value,
                        unit: kind.unit(),
                        status: classify(kind, value),
                    },
                );
            }
            None if options.keep_unrecognized => {
                other.insert(key.clone(), coerce(index, key, raw_value)?);
            }
            None => {
                tracing::trace!(record = index, sensor = %key, "dropping unrecognized sensor");
            }
        }
    }

    Ok(NormalizedReading {
        device_id: raw.device_id.clone(),
        timestamp: raw.timestamp,
        sensor_data,
        other,
    })
}

/// Status of a value against the kind's inclusive normal range.
pub fn classify(kind: SensorKind, value: f64) -> SensorStatus {
    // ---
    let (lower, upper) = kind.normal_range();
    if (lower..=upper).contains(&value) {
        SensorStatus::Normal
    } else {
        SensorStatus::Warning
    }
}

/// Numbers pass through, numeric strings are parsed, anything else fails.
fn coerce(index: usize, sensor: &str, raw: &Value) -> PipelineResult<f64> {
    // ---
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| PipelineError::TypeConversion {
            index,
            sensor: sensor.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn raw(values: Value) -> RawReading {
        RawReading {
            device_id: "comp-2".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 20, 14, 25, 0).unwrap(),
            sensor_values: values
                .as_object()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_units_and_status() {
        // ---
        let reading = normalize_reading(
            0,
            &raw(json!({"temperature": 95, "pressure": 88, "vibration": 8.5})),
            &PipelineOptions::default(),
        )
        .unwrap();

        let temp = &reading.sensor_data[&SensorKind::Temperature];
        assert_eq!(temp.value, 95.0);
        assert_eq!(temp.unit, "°C");
        assert_eq!(temp.status, SensorStatus::Warning);

        assert_eq!(reading.sensor_data[&SensorKind::Pressure].status, SensorStatus::Normal);
        assert_eq!(reading.sensor_data[&SensorKind::Vibration].status, SensorStatus::Warning);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        // ---
        assert_eq!(classify(SensorKind::Temperature, 20.0), SensorStatus::Normal);
        assert_eq!(classify(SensorKind::Temperature, 85.0), SensorStatus::Normal);
        assert_eq!(classify(SensorKind::Temperature, 85.1), SensorStatus::Warning);
        assert_eq!(classify(SensorKind::Temperature, 19.9), SensorStatus::Warning);
        assert_eq!(classify(SensorKind::Pressure, 95.0), SensorStatus::Normal);
        assert_eq!(classify(SensorKind::Pressure, -0.5), SensorStatus::Warning);
        assert_eq!(classify(SensorKind::Vibration, 8.0), SensorStatus::Normal);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        // ---
        let reading = normalize_reading(
            0,
            &raw(json!({"temperature": " 72.5 "})),
            &PipelineOptions::default(),
        )
        .unwrap();
        assert_eq!(reading.sensor_data[&SensorKind::Temperature].value, 72.5);
    }

    #[test]
    fn test_non_numeric_value_is_type_conversion_error() {
        // ---
        let opts = PipelineOptions::default();
        for bad in [json!("hot"), json!(true), json!(null), json!({"v": 1}), json!("inf")] {
            let err = normalize_reading(4, &raw(json!({"pressure": bad})), &opts).unwrap_err();
            match err {
                PipelineError::TypeConversion { index, sensor, .. } => {
                    assert_eq!(index, 4);
                    assert_eq!(sensor, "pressure");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_unrecognized_sensors_dropped_by_default() {
        // ---
        let reading = normalize_reading(
            0,
            &raw(json!({"temperature": 40, "humidity": "n/a"})),
            &PipelineOptions::default(),
        )
        .unwrap();

        assert_eq!(reading.sensor_data.len(), 1);
        assert!(reading.other.is_empty());
    }

    #[test]
    fn test_unrecognized_sensors_kept_on_request() {
        // ---
        let opts = PipelineOptions {
            keep_unrecognized: true,
        };
        let reading = normalize_reading(0, &raw(json!({"humidity": 55, "rpm": "1200"})), &opts).unwrap();

        assert!(!reading.has_recognized());
        assert_eq!(reading.other.get("humidity"), Some(&55.0));
        assert_eq!(reading.other.get("rpm"), Some(&1200.0));

        let err = normalize_reading(0, &raw(json!({"humidity": "wet"})), &opts).unwrap_err();
        assert!(matches!(err, PipelineError::TypeConversion { .. }));
    }

    #[test]
    fn test_batch_stops_at_first_bad_record() {
        // ---
        let batch = vec![
            raw(json!({"temperature": 40})),
            raw(json!({"temperature": "cold"})),
            raw(json!({"temperature": "also bad"})),
        ];
        let err = normalize_batch(&batch, &PipelineOptions::default()).unwrap_err();
        assert_eq!(err.index(), Some(1));
    }
}
