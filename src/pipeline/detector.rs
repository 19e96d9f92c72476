//! Threshold-based anomaly detection.
//!
//! The rule set lives in one static table, [`THRESHOLDS`]. For each sensor
//! kind the first matching rule wins, so the error rule of a kind must come
//! before its warning rule.

use crate::models::{Alert, AlertKind, NormalizedReading, SensorKind, Severity};

// ---

/// Direction of a threshold breach. Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breach {
    Above(f64),
    Below(f64),
}

impl Breach {
    // ---
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Breach::Above(limit) => value > limit,
            Breach::Below(limit) => value < limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    // ---
    pub sensor: SensorKind,
    pub breach: Breach,
    pub severity: Severity,
    pub alert: AlertKind,
}

pub static THRESHOLDS: &[ThresholdRule] = &[
    ThresholdRule {
        sensor: SensorKind::Temperature,
        breach: Breach::Above(90.0),
        severity: Severity::Error,
        alert: AlertKind::TemperatureHigh,
    },
    ThresholdRule {
        sensor: SensorKind::Temperature,
        breach: Breach::Above(85.0),
        severity: Severity::Warning,
        alert: AlertKind::TemperatureHigh,
    },
    ThresholdRule {
        sensor: SensorKind::Temperature,
        breach: Breach::Below(10.0),
        severity: Severity::Warning,
        alert: AlertKind::TemperatureLow,
    },
    ThresholdRule {
        sensor: SensorKind::Pressure,
        breach: Breach::Above(95.0),
        severity: Severity::Error,
        alert: AlertKind::PressureHigh,
    },
    ThresholdRule {
        sensor: SensorKind::Vibration,
        breach: Breach::Above(10.0),
        severity: Severity::Error,
        alert: AlertKind::VibrationHigh,
    },
    ThresholdRule {
        sensor: SensorKind::Vibration,
        breach: Breach::Above(8.0),
        severity: Severity::Warning,
        alert: AlertKind::VibrationHigh,
    },
];

/// First rule of `sensor` breached by `value`, if any.
pub fn matching_rule(sensor: SensorKind, value: f64) -> Option<&'static ThresholdRule> {
    // ---
    THRESHOLDS
        .iter()
        .filter(|rule| rule.sensor == sensor)
        .find(|rule| rule.breach.matches(value))
}

/// Evaluate one reading. Alerts come out in temperature, pressure,
/// vibration order; at most one per sensor kind.
pub fn evaluate(reading: &NormalizedReading) -> Vec<Alert> {
    // ---
    SensorKind::ALL
        .iter()
        .filter_map(|kind| {
            let sensor = reading.sensor_data.get(kind)?;
            let rule = matching_rule(*kind, sensor.value)?;
            Some(Alert {
                kind: rule.alert,
                device_id: reading.device_id.clone(),
                message: format!(
                    "{} on {}: {}{}",
                    rule.alert.label(),
                    reading.device_id,
                    sensor.value,
                    sensor.unit
                ),
                severity: rule.severity,
                value: sensor.value,
                timestamp: reading.timestamp,
            })
        })
        .collect()
}
