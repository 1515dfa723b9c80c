//! Core error types for `meterfocus`.

use thiserror::Error;

/// Core error type for query construction and serialization.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A query parameter is missing or out of range.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A required output field could not be derived from a source record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to map field '{field}': {reason}")]
pub struct MappingError {
    /// Name of the field that failed.
    pub field: String,
    /// Why the value could not be derived.
    pub reason: String,
}

impl MappingError {
    /// Creates a new mapping error for the given field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        "MAPPING_FIELD_ERROR"
    }

    /// HTTP status a boundary layer should report.
    pub fn status_code(&self) -> u16 {
        422
    }

    /// Renders the boundary error body.
    pub fn to_error_body(&self, request_id: &str) -> serde_json::Value {
        error_body(
            self.error_code(),
            &self.to_string(),
            Some(serde_json::json!({ "field": self.field })),
            request_id,
        )
    }
}

/// Builds the `{error, error_code, message, details, request_id}` body a
/// boundary layer returns for a failed request.
pub fn error_body(
    error_code: &str,
    message: &str,
    details: Option<serde_json::Value>,
    request_id: &str,
) -> serde_json::Value {
    serde_json::json!({
        "error": true,
        "error_code": error_code,
        "message": message,
        "details": details,
        "request_id": request_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_message_names_field() {
        let err = MappingError::new("charge_period_start", "Empty datetime value.");
        assert_eq!(
            err.to_string(),
            "Failed to map field 'charge_period_start': Empty datetime value."
        );
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_error_body_shape() {
        let body = MappingError::new("charge_period_end", "bad").to_error_body("req-1");
        assert_eq!(body["error"], true);
        assert_eq!(body["error_code"], "MAPPING_FIELD_ERROR");
        assert_eq!(body["details"]["field"], "charge_period_end");
        assert_eq!(body["request_id"], "req-1");
    }
}
