//! HTTP error mapping for the route handlers.
//!
//! Pipeline failures caused by the submitted batch become `400`; anything
//! that goes wrong on our side (or upstream) becomes a `5xx`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::pipeline::{ErrorClass, PipelineError};

// ---

#[derive(Debug)]
pub enum ApiError {
    /// Batch rejected by the pipeline.
    Pipeline(PipelineError),

    /// Endpoint needs configuration that is not present.
    NotConfigured(&'static str),

    /// Upstream fixture source failed.
    Upstream(anyhow::Error),

    Internal(anyhow::Error),
}

/// JSON body returned for every error.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ApiError {
    // ---
    fn status(&self) -> StatusCode {
        // ---
        match self {
            Self::Pipeline(e) => match e.class() {
                ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
                ErrorClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let status = self.status();
        let body = match &self {
            Self::Pipeline(e) => ErrorBody {
                error: e.to_string(),
                kind: e.kind(),
                index: e.index(),
                field: e.field().map(str::to_string),
            },
            Self::NotConfigured(what) => ErrorBody {
                error: format!("{what} is not configured"),
                kind: "not_configured",
                index: None,
                field: None,
            },
            Self::Upstream(e) => {
                error!("Upstream fixture source failed: {:#}", e);
                ErrorBody {
                    error: "Failed to fetch data from upstream source".to_string(),
                    kind: "upstream",
                    index: None,
                    field: None,
                }
            }
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                ErrorBody {
                    error: "Internal server error".to_string(),
                    kind: "internal",
                    index: None,
                    field: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
