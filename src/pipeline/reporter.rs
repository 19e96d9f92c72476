//! Reshapes accumulator state into the report the caller receives.
//!
//! Nothing here looks at readings again. Empty accumulators give the
//! zero-valued shape.

use std::collections::BTreeMap;

use crate::models::{
    Alert, BatchReport, DailySummary, DeviceEfficiency, DeviceFlag, FleetKpis, HourlyRecord,
    SensorKind,
};

use super::aggregator::{Aggregator, DeviceTally, KindStats};
use super::{health, round2};

// ---

/// Devices below this efficiency are flagged `low_efficiency`.
const LOW_EFFICIENCY: f64 = 70.0;
/// Devices below this health score are flagged `low_health`.
const LOW_HEALTH: f64 = 60.0;

pub fn build_report(agg: &Aggregator, alerts: Vec<Alert>) -> BatchReport {
    // ---
    let ranking = efficiency_ranking(agg);
    BatchReport {
        hourly_rollup: hourly_rollup(agg),
        daily_summary: daily_summary(agg, alerts.len()),
        kpis: fleet_kpis(agg, &ranking),
        device_efficiency_ranking: ranking,
        alerts,
    }
}

/// One record per observed hour, ascending.
pub fn hourly_rollup(agg: &Aggregator) -> Vec<HourlyRecord> {
    // ---
    agg.hours
        .iter()
        .map(|(hour, bucket)| HourlyRecord {
            timestamp: hour.format("%Y-%m-%dT%H:00:00").to_string(),
            average_temperature: average(&bucket.stats, SensorKind::Temperature),
            average_pressure: average(&bucket.stats, SensorKind::Pressure),
            average_vibration: average(&bucket.stats, SensorKind::Vibration),
            equipment_count: bucket.devices.len(),
            data_point_count: bucket.data_points,
            other_averages: bucket
                .other
                .iter()
                .map(|(key, stat)| (key.clone(), round2(stat.mean())))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect()
}

pub fn daily_summary(agg: &Aggregator, alert_count: usize) -> DailySummary {
    // ---
    let totals = &agg.totals;
    let temperature = totals
        .stats
        .get(&SensorKind::Temperature)
        .copied()
        .unwrap_or_default();

    DailySummary {
        date: totals.earliest.map(|ts| ts.date_naive()),
        total_records: totals.records,
        equipment_count: totals.devices.len(),
        average_temperature: round2(temperature.mean()),
        min_temperature: temperature.min.unwrap_or(0.0),
        max_temperature: temperature.max.unwrap_or(0.0),
        average_pressure: average(&totals.stats, SensorKind::Pressure),
        average_vibration: average(&totals.stats, SensorKind::Vibration),
        alert_count,
    }
}

/// Devices by efficiency descending, ties by device ID ascending.
pub fn efficiency_ranking(agg: &Aggregator) -> Vec<DeviceEfficiency> {
    // ---
    let mut ranking: Vec<DeviceEfficiency> = agg
        .devices
        .iter()
        .filter(|(_, tally)| tally.total > 0)
        .map(|(device_id, tally)| device_record(device_id, tally))
        .collect();

    ranking.sort_by(|a, b| {
        b.efficiency
            .total_cmp(&a.efficiency)
            .then_with(|| a.device_id.cmp(&b.device_id))
    });
    ranking
}

fn device_record(device_id: &str, tally: &DeviceTally) -> DeviceEfficiency {
    // ---
    let efficiency = round2(tally.normal as f64 / tally.total as f64 * 100.0);
    let avg_temperature = tally
        .stats
        .get(&SensorKind::Temperature)
        .filter(|s| s.count > 0)
        .map(|s| s.mean());
    let health_score = health::health_score(efficiency, avg_temperature);

    DeviceEfficiency {
        device_id: device_id.to_string(),
        efficiency,
        total_data_points: tally.total,
        normal_operation_count: tally.normal,
        warning_count: tally.warning,
        error_count: tally.error,
        average_temperature: round2(avg_temperature.unwrap_or(0.0)),
        average_pressure: average(&tally.stats, SensorKind::Pressure),
        average_vibration: average(&tally.stats, SensorKind::Vibration),
        health_score,
        trend: health::trend(efficiency),
        flags: device_flags(efficiency, health_score),
    }
}

fn device_flags(efficiency: f64, health_score: f64) -> Vec<DeviceFlag> {
    // ---
    let mut flags = Vec::new();
    if efficiency < LOW_EFFICIENCY {
        flags.push(DeviceFlag::LowEfficiency);
    }
    if health_score < LOW_HEALTH {
        flags.push(DeviceFlag::LowHealth);
    }
    flags
}

/// Fleet KPIs derived from the ranking and the batch totals.
///
/// `operationalRatio` is the share of readings whose operational state is
/// not `error`. Everything is `0` for an empty batch.
pub fn fleet_kpis(agg: &Aggregator, ranking: &[DeviceEfficiency]) -> FleetKpis {
    // ---
    let records = agg.totals.records;
    let errors: u64 = agg.devices.values().map(|tally| tally.error).sum();
    let efficiencies: Vec<f64> = ranking.iter().map(|d| d.efficiency).collect();

    let operational_ratio = if records == 0 {
        0.0
    } else {
        records.saturating_sub(errors) as f64 / records as f64 * 100.0
    };

    FleetKpis {
        overall_efficiency: round2(mean(&efficiencies)),
        efficiency_std: round2(sample_std_dev(&efficiencies)),
        operational_ratio: round2(operational_ratio),
        equipment_count: ranking.len(),
        data_points: records,
    }
}

fn mean(values: &[f64]) -> f64 {
    // ---
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample (n - 1) standard deviation, `0` for fewer than two values.
fn sample_std_dev(values: &[f64]) -> f64 {
    // ---
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let squares: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (squares / (values.len() - 1) as f64).sqrt()
}

fn average(stats: &KindStats, kind: SensorKind) -> f64 {
    round2(stats.get(&kind).map_or(0.0, |s| s.mean()))
}
