//! Transform error types.

use meterfocus_core::{error_body, MappingError};
use meterfocus_fetch::FetchError;
use thiserror::Error;

/// Error type for a transform run.
///
/// Fetch and mapping errors pass through unchanged.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Authentication or fetch failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A required output field could not be derived.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Any other failure while mapping a record.
    #[error("Failed to transform record '{record_id}': {source}")]
    Transformation {
        /// ID of the offending source record.
        record_id: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransformError {
    /// Wraps an unexpected failure for a record.
    pub fn transformation(
        record_id: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transformation {
            record_id: record_id.into(),
            source: source.into(),
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.error_code(),
            Self::Mapping(e) => e.error_code(),
            Self::Transformation { .. } => "TRANSFORMATION_ERROR",
        }
    }

    /// HTTP status a boundary layer should report.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Fetch(e) => e.status_code(),
            Self::Mapping(e) => e.status_code(),
            Self::Transformation { .. } => 422,
        }
    }

    /// Renders the boundary error body.
    pub fn to_error_body(&self, request_id: &str) -> serde_json::Value {
        match self {
            Self::Fetch(e) => e.to_error_body(request_id),
            Self::Mapping(e) => e.to_error_body(request_id),
            Self::Transformation { record_id, source } => error_body(
                self.error_code(),
                &self.to_string(),
                Some(serde_json::json!({
                    "source_id": record_id,
                    "reason": source.to_string(),
                })),
                request_id,
            ),
        }
    }
}
