//! Accumulators for one batch.
//!
//! Three keyed folds run over the same normalized readings: per hour
//! bucket, per device, and whole-batch totals for the daily summary. All
//! maps are `BTreeMap`s so that reporting order is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, DurationRound, Utc};

use crate::models::{Alert, NormalizedReading, OperationalState, SensorKind, SensorStatus, Severity};

// ---

/// Running sum/count with min/max, for incremental means.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    // ---
    pub sum: f64,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RunningStat {
    // ---
    pub fn push(&mut self, value: f64) {
        // ---
        self.sum += value;
        self.count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Mean of the pushed values, `0.0` when nothing was pushed.
    pub fn mean(&self) -> f64 {
        // ---
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Stats per recognized sensor kind.
pub type KindStats = BTreeMap<SensorKind, RunningStat>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourBucket {
    // ---
    pub stats: KindStats,
    pub other: BTreeMap<String, RunningStat>,
    pub devices: BTreeSet<String>,

    /// Readings folded into this bucket.
    pub data_points: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceTally {
    // ---
    pub total: u64,
    pub normal: u64,
    pub warning: u64,
    pub error: u64,
    pub stats: KindStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTotals {
    // ---
    pub records: u64,
    pub devices: BTreeSet<String>,
    pub stats: KindStats,
    pub earliest: Option<DateTime<Utc>>,
}

/// All accumulator state for one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregator {
    // ---
    pub hours: BTreeMap<DateTime<Utc>, HourBucket>,
    pub devices: BTreeMap<String, DeviceTally>,
    pub totals: BatchTotals,
}

impl Aggregator {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reading and the alerts the detector raised for it.
    pub fn fold(&mut self, reading: &NormalizedReading, alerts: &[Alert]) {
        // ---
        self.fold_hourly(reading);
        self.fold_device(reading, alerts);
        self.fold_totals(reading);
    }

    fn fold_hourly(&mut self, reading: &NormalizedReading) {
        // ---
        if !reading.has_recognized() && reading.other.is_empty() {
            return;
        }

        let bucket = self.hours.entry(hour_start(reading.timestamp)).or_default();
        for (key, value) in &reading.other {
            bucket.other.entry(key.clone()).or_default().push(*value);
        }

        // Only readings with a recognized sensor are data points.
        if reading.has_recognized() {
            push_all(&mut bucket.stats, reading);
            bucket.devices.insert(reading.device_id.clone());
            bucket.data_points += 1;
        }
    }

    fn fold_device(&mut self, reading: &NormalizedReading, alerts: &[Alert]) {
        // ---
        let tally = self.devices.entry(reading.device_id.clone()).or_default();
        tally.total += 1;
        match operational_state(reading, alerts) {
            OperationalState::Normal => tally.normal += 1,
            OperationalState::Warning => tally.warning += 1,
            OperationalState::Error => tally.error += 1,
        }
        push_all(&mut tally.stats, reading);
    }

    fn fold_totals(&mut self, reading: &NormalizedReading) {
        // ---
        let totals = &mut self.totals;
        totals.records += 1;
        totals.devices.insert(reading.device_id.clone());
        push_all(&mut totals.stats, reading);
        totals.earliest = Some(
            totals
                .earliest
                .map_or(reading.timestamp, |ts| ts.min(reading.timestamp)),
        );
    }
}

fn push_all(stats: &mut KindStats, reading: &NormalizedReading) {
    // ---
    for (kind, sensor) in &reading.sensor_data {
        stats.entry(*kind).or_default().push(sensor.value);
    }
}

/// Truncate a timestamp to the top of its hour.
pub fn hour_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    // ---
    // Truncation only fails for timestamps near the representable limits.
    ts.duration_trunc(chrono::Duration::hours(1)).unwrap_or(ts)
}

/// Classify a reading: any error alert makes it `Error`, any warning alert
/// or warning sensor status makes it `Warning`, otherwise `Normal`.
pub fn operational_state(reading: &NormalizedReading, alerts: &[Alert]) -> OperationalState {
    // ---
    let worst_alert = alerts.iter().map(|a| a.severity).max();
    let any_warning_status = reading
        .sensor_data
        .values()
        .any(|s| s.status == SensorStatus::Warning);

    match worst_alert {
        Some(Severity::Error) => OperationalState::Error,
        Some(Severity::Warning) => OperationalState::Warning,
        None if any_warning_status => OperationalState::Warning,
        None => OperationalState::Normal,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{AlertKind, SensorValue};
    use crate::pipeline::{detector, normalizer};
    use chrono::TimeZone;

    fn reading(device: &str, hour: u32, minute: u32, values: &[(SensorKind, f64)]) -> NormalizedReading {
        // ---
        NormalizedReading {
            device_id: device.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 20, hour, minute, 0).unwrap(),
            sensor_data: values
                .iter()
                .map(|(kind, value)| {
                    (
                        *kind,
                        SensorValue {
                            value: *value,
                            unit: kind.unit(),
                            status: normalizer::classify(*kind, *value),
                        },
                    )
                })
                .collect(),
            other: BTreeMap::new(),
        }
    }

    fn fold_all(readings: &[NormalizedReading]) -> Aggregator {
        // ---
        let mut agg = Aggregator::new();
        for r in readings {
            let alerts = detector::evaluate(r);
            agg.fold(r, &alerts);
        }
        agg
    }

    #[test]
    fn test_running_stat() {
        // ---
        let mut stat = RunningStat::default();
        assert_eq!(stat.mean(), 0.0);

        for v in [4.0, 8.0, 6.0] {
            stat.push(v);
        }
        assert_eq!(stat.count, 3);
        assert_eq!(stat.mean(), 6.0);
        assert_eq!(stat.min, Some(4.0));
        assert_eq!(stat.max, Some(8.0));
    }

    #[test]
    fn test_hour_start_truncates() {
        // ---
        let ts = Utc.with_ymd_and_hms(2024, 1, 20, 10, 59, 59).unwrap();
        assert_eq!(hour_start(ts), Utc.with_ymd_and_hms(2024, 1, 20, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_hourly_buckets_group_by_hour() {
        // ---
        let agg = fold_all(&[
            reading("A1", 10, 5, &[(SensorKind::Temperature, 70.0)]),
            reading("B2", 10, 45, &[(SensorKind::Temperature, 80.0), (SensorKind::Pressure, 60.0)]),
            reading("A1", 11, 0, &[(SensorKind::Vibration, 3.0)]),
        ]);

        assert_eq!(agg.hours.len(), 2);
        let ten = &agg.hours[&Utc.with_ymd_and_hms(2024, 1, 20, 10, 0, 0).unwrap()];
        assert_eq!(ten.data_points, 2);
        assert_eq!(ten.devices.len(), 2);
        assert_eq!(ten.stats[&SensorKind::Temperature].mean(), 75.0);
        assert_eq!(ten.stats[&SensorKind::Pressure].count, 1);
        assert!(!ten.stats.contains_key(&SensorKind::Vibration));
    }

    #[test]
    fn test_reading_without_recognized_sensors_skips_hourly() {
        // ---
        let agg = fold_all(&[reading("A1", 10, 0, &[])]);

        assert!(agg.hours.is_empty());
        assert_eq!(agg.devices["A1"].total, 1);
        assert_eq!(agg.totals.records, 1);
    }

    #[test]
    fn test_other_only_reading_is_not_a_data_point() {
        // ---
        let mut humidity_only = reading("A1", 10, 5, &[]);
        humidity_only.other.insert("humidity".to_string(), 40.0);
        let mut agg = Aggregator::new();
        agg.fold(&humidity_only, &[]);
        let with_temp = reading("B2", 10, 30, &[(SensorKind::Temperature, 60.0)]);
        agg.fold(&with_temp, &detector::evaluate(&with_temp));

        let bucket = &agg.hours[&Utc.with_ymd_and_hms(2024, 1, 20, 10, 0, 0).unwrap()];
        assert_eq!(bucket.data_points, 1);
        assert_eq!(bucket.devices.len(), 1);
        assert!(bucket.devices.contains("B2"));
        assert_eq!(bucket.other["humidity"].mean(), 40.0);
    }

    #[test]
    fn test_device_tallies() {
        // ---
        let agg = fold_all(&[
            reading("D1", 10, 0, &[(SensorKind::Temperature, 70.0)]),
            reading("D1", 10, 10, &[(SensorKind::Temperature, 95.0)]),
            reading("D1", 10, 20, &[(SensorKind::Temperature, 5.0)]),
            reading("D1", 10, 30, &[(SensorKind::Temperature, 15.0)]),
        ]);

        let tally = &agg.devices["D1"];
        assert_eq!(tally.total, 4);
        assert_eq!(tally.normal, 1);
        assert_eq!(tally.error, 1);
        // 5 °C raises a low-temperature warning; 15 °C is only outside the normal range
        assert_eq!(tally.warning, 2);
        assert_eq!(tally.stats[&SensorKind::Temperature].count, 4);
    }

    #[test]
    fn test_operational_state_prefers_worst() {
        // ---
        let r = reading("D1", 10, 0, &[(SensorKind::Temperature, 95.0), (SensorKind::Vibration, 8.5)]);
        let alerts = detector::evaluate(&r);
        assert_eq!(alerts.len(), 2);
        assert_eq!(operational_state(&r, &alerts), OperationalState::Error);

        let warn_only: Vec<_> = alerts
            .into_iter()
            .filter(|a| a.kind == AlertKind::VibrationHigh)
            .collect();
        assert_eq!(operational_state(&r, &warn_only), OperationalState::Warning);
    }

    #[test]
    fn test_totals_track_earliest_and_devices() {
        // ---
        let agg = fold_all(&[
            reading("A1", 12, 0, &[(SensorKind::Temperature, 60.0)]),
            reading("B2", 9, 30, &[(SensorKind::Temperature, 40.0)]),
            reading("A1", 11, 0, &[(SensorKind::Temperature, 50.0)]),
        ]);

        assert_eq!(agg.totals.records, 3);
        assert_eq!(agg.totals.devices.len(), 2);
        assert_eq!(
            agg.totals.earliest,
            Some(Utc.with_ymd_and_hms(2024, 1, 20, 9, 30, 0).unwrap())
        );
        let temp = agg.totals.stats[&SensorKind::Temperature];
        assert_eq!((temp.min, temp.max), (Some(40.0), Some(60.0)));
    }

    #[test]
    fn test_identical_input_gives_identical_state() {
        // ---
        let batch = vec![
            reading("A1", 10, 5, &[(SensorKind::Temperature, 91.0)]),
            reading("B2", 11, 5, &[(SensorKind::Pressure, 99.0)]),
        ];
        assert_eq!(fold_all(&batch), fold_all(&batch));
    }
}
