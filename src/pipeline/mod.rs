//! Telemetry aggregation and alerting pipeline.
//!
//! One batch flows strictly in one direction:
//!
//! ```text
//! raw JSON -> validator -> normalizer -> { detector, aggregator } -> reporter
//! ```
//!
//! Each [`Pipeline::run`] call owns its accumulators; nothing is shared
//! between calls, so concurrent requests each get an independent run.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{Alert, BatchReport, NormalizedReading};

pub mod aggregator;
pub mod detector;
mod error;
pub mod health;
pub mod normalizer;
pub mod reporter;
pub mod validator;

pub use aggregator::Aggregator;
pub use error::{ErrorClass, PipelineError, PipelineResult};

// ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Keep unrecognized sensor keys as unclassified "other" metrics
    /// instead of dropping them.
    pub keep_unrecognized: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    // ---
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Run one batch of raw JSON records end to end.
    ///
    /// An empty batch yields the empty report. Any invalid record rejects
    /// the whole batch.
    #[tracing::instrument(name = "pipeline", skip_all, fields(records = records.len()))]
    pub fn run(&self, records: &[Value]) -> PipelineResult<BatchReport> {
        // ---
        let batch = match validator::validate_batch(records) {
            Ok(batch) => batch,
            Err(PipelineError::EmptyInput) => {
                info!("Empty batch, returning empty report");
                return Ok(reporter::build_report(&Aggregator::new(), Vec::new()));
            }
            Err(e) => {
                warn!("Batch rejected: {}", e);
                return Err(e);
            }
        };
        debug!("Validated {} records", batch.len());

        let normalized = normalizer::normalize_batch(&batch, &self.options).inspect_err(|e| {
            warn!("Batch rejected: {}", e);
        })?;
        debug!("Normalized {} readings", normalized.len());

        let report = self.aggregate(&normalized);
        info!(
            "Batch complete: {} hours, {} devices, {} alerts",
            report.hourly_rollup.len(),
            report.device_efficiency_ranking.len(),
            report.alerts.len()
        );
        Ok(report)
    }

    /// Detect, fold and report over already-normalized readings.
    pub fn aggregate(&self, readings: &[NormalizedReading]) -> BatchReport {
        // ---
        let mut agg = Aggregator::new();
        let mut alerts = Vec::new();

        for reading in readings {
            let found = detector::evaluate(reading);
            agg.fold(reading, &found);
            alerts.extend(found);
        }
        debug!("Folded {} readings, {} alerts raised", readings.len(), alerts.len());

        reporter::build_report(&agg, alerts)
    }

    /// Validate, normalize and check a single record without aggregating.
    pub fn process_reading(&self, record: &Value) -> PipelineResult<(NormalizedReading, Vec<Alert>)> {
        // ---
        let raw = validator::validate_record(0, record)?;
        let reading = normalizer::normalize_reading(0, &raw, &self.options)?;
        let alerts = detector::evaluate(&reading);
        debug!(device = %reading.device_id, "Processed single reading, {} alerts", alerts.len());
        Ok((reading, alerts))
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
