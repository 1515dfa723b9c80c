//! Fetch error types.

use meterfocus_core::{error_body, CoreError};
use thiserror::Error;

/// Maximum number of body characters kept on an error for diagnostics.
pub const MAX_BODY_CHARS: usize = 500;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for authentication and fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream could not be reached.
    #[error("Unable to connect to {endpoint}: {message}")]
    Connection {
        /// Endpoint being called.
        endpoint: String,
        /// Transport error text.
        message: String,
    },

    /// The upstream did not answer in time (client timeout or gateway 504).
    #[error("Request to {endpoint} timed out: {message}")]
    Timeout {
        /// Endpoint being called.
        endpoint: String,
        /// What timed out.
        message: String,
    },

    /// Credentials or token rejected.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Why authentication failed.
        message: String,
        /// Truncated response body, if any.
        body: Option<String>,
    },

    /// Unexpected status or unparsable body from an upstream endpoint.
    #[error("Upstream error from {endpoint}: {message}")]
    Upstream {
        /// Endpoint being called.
        endpoint: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// What went wrong.
        message: String,
        /// Truncated response body, if any.
        body: Option<String>,
    },

    /// The request could not be built (bad query, URL or header value).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The caller cancelled the operation.
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Creates an authentication error without a body.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            body: None,
        }
    }

    /// Creates an authentication error carrying the response body.
    pub fn auth_with_body(message: impl Into<String>, body: &str) -> Self {
        Self::Auth {
            message: message.into(),
            body: Some(truncate_body(body)),
        }
    }

    /// Creates an upstream error for a response with an unexpected status.
    pub fn unexpected_status(endpoint: &str, status: u16, body: &str) -> Self {
        Self::Upstream {
            endpoint: endpoint.to_string(),
            status: Some(status),
            message: format!("Upstream returned HTTP {status}"),
            body: Some(truncate_body(body)),
        }
    }

    /// Creates an upstream error for a body that could not be parsed.
    pub fn unparsable(endpoint: &str, error: &serde_json::Error, body: &str) -> Self {
        Self::Upstream {
            endpoint: endpoint.to_string(),
            status: None,
            message: format!("Failed to parse response: {error}"),
            body: Some(truncate_body(body)),
        }
    }

    /// Maps a transport error from `reqwest`.
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Connection {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "SOURCE_API_CONNECTION_ERROR",
            Self::Timeout { .. } => "SOURCE_API_TIMEOUT",
            Self::Auth { .. } => "AUTH_ERROR",
            Self::Upstream { .. } => "SOURCE_API_ERROR",
            Self::InvalidRequest(_) => "VALIDATION_ERROR",
            Self::Cancelled => "REQUEST_CANCELLED",
        }
    }

    /// HTTP status a boundary layer should report.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Connection { .. } | Self::Upstream { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::Auth { .. } => 401,
            Self::InvalidRequest(_) => 400,
            Self::Cancelled => 499,
        }
    }

    /// Structured diagnostic details, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Connection { endpoint, message } | Self::Timeout { endpoint, message } => {
                Some(serde_json::json!({ "endpoint": endpoint, "error": message }))
            }
            Self::Auth {
                body: Some(body), ..
            } => Some(serde_json::json!({ "body": body })),
            Self::Upstream {
                endpoint,
                status,
                body,
                ..
            } => Some(serde_json::json!({
                "endpoint": endpoint,
                "status_code": status,
                "body": body,
            })),
            _ => None,
        }
    }

    /// Renders the boundary error body.
    pub fn to_error_body(&self, request_id: &str) -> serde_json::Value {
        error_body(self.error_code(), &self.to_string(), self.details(), request_id)
    }
}

impl From<CoreError> for FetchError {
    fn from(err: CoreError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

/// Truncates a response body for diagnostics, respecting char boundaries.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short() {
        assert_eq!(truncate_body("hello"), "hello");
    }

    #[test]
    fn test_truncate_body_long() {
        let body = "é".repeat(MAX_BODY_CHARS + 20);
        assert_eq!(truncate_body(&body).chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn test_status_codes() {
        let timeout = FetchError::Timeout {
            endpoint: "iam".to_string(),
            message: "504".to_string(),
        };
        assert_eq!(timeout.status_code(), 504);
        assert_eq!(timeout.error_code(), "SOURCE_API_TIMEOUT");

        let auth = FetchError::auth("rejected");
        assert_eq!(auth.status_code(), 401);

        let upstream = FetchError::unexpected_status("/rest/x", 500, "boom");
        assert_eq!(upstream.status_code(), 502);
        assert_eq!(upstream.details().unwrap()["status_code"], 500);
    }

    #[test]
    fn test_core_error_becomes_invalid_request() {
        let err: FetchError = CoreError::InvalidQuery("limit out of range".to_string()).into();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
        assert_eq!(err.status_code(), 400);
    }
}
