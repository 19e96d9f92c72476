//! Error type for the telemetry pipeline.
//!
//! Every error is local to one batch. Callers reject the whole batch on
//! `Validation` and `TypeConversion`; `EmptyInput` is reported by the
//! validator but turned into an empty report by [`super::Pipeline::run`].

use thiserror::Error;

/// Result type for pipeline stages.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Required field missing or malformed.
    #[error("record {index}: field `{field}` {reason}")]
    Validation {
        /// Position of the first offending record in the batch
        index: usize,
        field: String,
        reason: String,
    },

    /// Sensor value could not be read as a number.
    #[error("record {index}: sensor `{sensor}` has non-numeric value {value}")]
    TypeConversion {
        index: usize,
        sensor: String,
        /// Offending value, rendered as JSON
        value: String,
    },

    #[error("batch contains no readings")]
    EmptyInput,
}

/// How an HTTP-facing caller should classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    ServerError,
}

impl PipelineError {
    // ---
    pub(crate) fn validation(index: usize, field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag for the error body.
    pub fn kind(&self) -> &'static str {
        // ---
        match self {
            Self::Validation { .. } => "validation",
            Self::TypeConversion { .. } => "type_conversion",
            Self::EmptyInput => "empty_input",
        }
    }

    /// All pipeline errors are caused by the submitted batch.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::BadRequest
    }

    /// Index of the offending record, when the error is about one record.
    pub fn index(&self) -> Option<usize> {
        // ---
        match self {
            Self::Validation { index, .. } | Self::TypeConversion { index, .. } => Some(*index),
            Self::EmptyInput => None,
        }
    }

    /// Offending field or sensor key.
    pub fn field(&self) -> Option<&str> {
        // ---
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::TypeConversion { sensor, .. } => Some(sensor),
            Self::EmptyInput => None,
        }
    }
}
