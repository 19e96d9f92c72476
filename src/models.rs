//! Data models for the telemetry pipeline.
//!
//! Wire types use `camelCase` field names so the JSON matches what the
//! dashboard and the device-side processor already send and expect.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// Sensor kinds the pipeline understands.
///
/// Variant order is the evaluation and reporting order (temperature, then
/// pressure, then vibration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Pressure,
    Vibration,
}

impl SensorKind {
    // ---
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Temperature,
        SensorKind::Pressure,
        SensorKind::Vibration,
    ];

    /// Map a raw `sensorValues` key to a known kind.
    pub fn from_key(key: &str) -> Option<Self> {
        // ---
        match key {
            "temperature" => Some(Self::Temperature),
            "pressure" => Some(Self::Pressure),
            "vibration" => Some(Self::Vibration),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        // ---
        match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Vibration => "vibration",
        }
    }

    pub fn unit(&self) -> &'static str {
        // ---
        match self {
            Self::Temperature => "°C",
            Self::Pressure => "%",
            Self::Vibration => "mm/s",
        }
    }

    /// Inclusive acceptable operating range `(lower, upper)`.
    ///
    /// Pressure is a 0-100 % ratio of rated pressure everywhere in this crate.
    pub fn normal_range(&self) -> (f64, f64) {
        // ---
        match self {
            Self::Temperature => (20.0, 85.0),
            Self::Pressure => (0.0, 95.0),
            Self::Vibration => (0.0, 8.0),
        }
    }
}

/// Per-sensor status assigned by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Normal,
    Warning,
}

/// Alert urgency. Ordered so that `Error > Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Overall operational state of one reading, used for device tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalState {
    Normal,
    Warning,
    Error,
}

/// Validated input record.
///
/// Sensor values are kept as raw JSON until the normalizer coerces them, so
/// a non-numeric value surfaces as a conversion error rather than a parse
/// failure of the whole body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    // ---
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub sensor_values: BTreeMap<String, Value>,
}

/// One typed, unit-tagged sensor value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorValue {
    // ---
    pub value: f64,
    pub unit: &'static str,
    pub status: SensorStatus,
}

/// Reading after normalization. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReading {
    // ---
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub sensor_data: BTreeMap<SensorKind, SensorValue>,

    /// Unclassified values for unrecognized keys, only populated when the
    /// caller opts in.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, f64>,
}

impl NormalizedReading {
    // ---
    pub fn has_recognized(&self) -> bool {
        !self.sensor_data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TemperatureHigh,
    TemperatureLow,
    PressureHigh,
    VibrationHigh,
}

impl AlertKind {
    // ---
    pub fn label(&self) -> &'static str {
        // ---
        match self {
            Self::TemperatureHigh => "High temperature",
            Self::TemperatureLow => "Low temperature",
            Self::PressureHigh => "High pressure",
            Self::VibrationHigh => "High vibration",
        }
    }
}

/// Threshold breach for one sensor of one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    // ---
    pub kind: AlertKind,
    pub device_id: String,
    pub message: String,
    pub severity: Severity,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

// ---

/// One hour bucket of the rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyRecord {
    // ---
    /// Top of the hour, `YYYY-MM-DDTHH:00:00` (UTC).
    pub timestamp: String,
    pub average_temperature: f64,
    pub average_pressure: f64,
    pub average_vibration: f64,
    pub equipment_count: usize,
    pub data_point_count: u64,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub other_averages: BTreeMap<String, f64>,
}

/// Whole-batch summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    // ---
    pub date: Option<NaiveDate>,
    pub total_records: u64,
    pub equipment_count: usize,
    pub average_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub average_pressure: f64,
    pub average_vibration: f64,
    pub alert_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTrend {
    Improving,
    Stable,
    Declining,
}

/// Per-device condition worth a maintainer's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFlag {
    /// Efficiency below 70 %.
    LowEfficiency,
    /// Health score below 60.
    LowHealth,
}

/// One row of the device efficiency ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEfficiency {
    // ---
    pub device_id: String,
    pub efficiency: f64,
    pub total_data_points: u64,
    pub normal_operation_count: u64,
    pub warning_count: u64,
    pub error_count: u64,
    pub average_temperature: f64,
    pub average_pressure: f64,
    pub average_vibration: f64,
    pub health_score: f64,
    pub trend: PerformanceTrend,
    pub flags: Vec<DeviceFlag>,
}

/// Fleet-level KPIs over the device ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetKpis {
    // ---
    /// Mean of per-device efficiency.
    pub overall_efficiency: f64,
    /// Sample standard deviation of per-device efficiency, `0` below two devices.
    pub efficiency_std: f64,
    /// Share of readings not classified as `error`, in percent.
    pub operational_ratio: f64,
    pub equipment_count: usize,
    pub data_points: u64,
}

/// Everything the pipeline returns for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    // ---
    pub hourly_rollup: Vec<HourlyRecord>,
    pub daily_summary: DailySummary,
    pub device_efficiency_ranking: Vec<DeviceEfficiency>,
    pub kpis: FleetKpis,
    pub alerts: Vec<Alert>,
}
