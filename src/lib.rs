//! Factory equipment telemetry: aggregation and alerting over batches of
//! IoT sensor readings, served over HTTP.
//!
//! Modules follow the Explicit Module Boundary Pattern (EMBP): each module
//! exposes a small gateway and the crate root re-exports what callers need,
//! so `routes/*.rs` only depend on items from here.

pub mod config;
pub mod models;
pub mod pipeline;
pub mod routes;

pub use config::Config;
pub use models::{
    Alert, AlertKind, BatchReport, DailySummary, DeviceEfficiency, DeviceFlag, FleetKpis, HourlyRecord,
    NormalizedReading, RawReading, SensorKind, SensorStatus, Severity,
};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions};
