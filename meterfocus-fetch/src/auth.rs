//! Identity exchange.
//!
//! Logs in against the IAM token endpoint with the password method and a
//! domain scope. The token comes back in a response header; the body
//! optionally carries `token.expires_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::host::HttpClient;
use crate::session::{Token, TokenSession};
use crate::settings::Credentials;

// ============================================================================
// Re-authentication Capability
// ============================================================================

/// Something that can obtain a fresh token into a session.
#[async_trait]
pub trait Reauthenticate: Send + Sync {
    /// Obtains a token and stores it into `session`.
    async fn authenticate(&self, session: &mut TokenSession) -> Result<Token, FetchError>;
}

// ============================================================================
// Identity Response
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct IdentityResponse {
    #[serde(default)]
    token: Option<IdentityToken>,
}

#[derive(Debug, Default, Deserialize)]
struct IdentityToken {
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    user: Option<IdentityUser>,
}

#[derive(Debug, Default, Deserialize)]
struct IdentityUser {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    domain: Option<IdentityDomain>,
}

#[derive(Debug, Default, Deserialize)]
struct IdentityDomain {
    #[serde(default)]
    name: Option<String>,
}

/// Parses an ISO 8601 timestamp (`Z` suffix or offset) into UTC.
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Authenticator
// ============================================================================

/// Performs the login exchange against the identity endpoint.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: HttpClient,
    credentials: Credentials,
    subject_token_header: String,
}

impl Authenticator {
    /// Creates an authenticator.
    pub fn new(
        http: HttpClient,
        credentials: Credentials,
        subject_token_header: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            subject_token_header: subject_token_header.into(),
        }
    }

    /// The credentials this authenticator logs in with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Requests a new token without touching any session.
    #[instrument(skip(self), fields(user = %self.credentials.username, domain = %self.credentials.auth_domain))]
    pub async fn request_token(&self) -> Result<Token, FetchError> {
        let url = self.credentials.token_url()?;
        info!("Authenticating with IAM");

        let response = self
            .http
            .post_json(&url, &self.credentials.login_body())
            .await?;

        match response.status {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(status = %response.status, "IAM rejected credentials");
                return Err(FetchError::auth_with_body(
                    format!("Invalid credentials (HTTP {})", response.status.as_u16()),
                    &response.body,
                ));
            }
            StatusCode::GATEWAY_TIMEOUT => {
                return Err(FetchError::Timeout {
                    endpoint: url.path().to_string(),
                    message: "IAM service gateway timeout".to_string(),
                });
            }
            status => {
                return Err(FetchError::unexpected_status(
                    url.path(),
                    status.as_u16(),
                    &response.body,
                ));
            }
        }

        let value = response
            .header(&self.subject_token_header)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                FetchError::auth(format!(
                    "IAM response missing {} header",
                    self.subject_token_header
                ))
            })?
            .to_string();

        let identity: IdentityResponse = serde_json::from_str(&response.body).unwrap_or_else(|e| {
            debug!(error = %e, "Identity response body not parsable");
            IdentityResponse::default()
        });
        let details = identity.token.unwrap_or_default();

        let expires_at = match details.expires_at.as_deref() {
            Some(raw) => {
                let parsed = parse_expiry(raw);
                if parsed.is_none() {
                    warn!(expires_at = raw, "Unparsable token expiry; treating token as non-expiring");
                }
                parsed
            }
            None => {
                warn!("Identity response has no expiry; treating token as non-expiring");
                None
            }
        };

        let user = details.user.unwrap_or_default();
        let user_name = user.name.unwrap_or_default();
        let domain_name = user.domain.and_then(|d| d.name).unwrap_or_default();
        info!(
            user = %user_name,
            domain = %domain_name,
            expires_at = ?expires_at,
            "Authenticated with IAM"
        );

        Ok(Token::new(value, expires_at))
    }
}

#[async_trait]
impl Reauthenticate for Authenticator {
    async fn authenticate(&self, session: &mut TokenSession) -> Result<Token, FetchError> {
        let token = self.request_token().await?;
        session.store(token.clone());
        Ok(token)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_expiry_z_suffix() {
        let parsed = parse_expiry("2025-04-02T10:00:00.000000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_expiry_offset() {
        let parsed = parse_expiry("2025-04-02T11:00:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_expiry_garbage() {
        assert!(parse_expiry("tomorrow").is_none());
    }

    #[test]
    fn test_identity_response_tolerates_missing_fields() {
        let parsed: IdentityResponse = serde_json::from_str(r#"{"token": {}}"#).unwrap();
        let token = parsed.token.unwrap();
        assert!(token.expires_at.is_none());
        assert!(token.user.is_none());
    }
}
