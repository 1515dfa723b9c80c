//! Endpoint settings and credentials.
//!
//! [`SourceSettings`] describes where the SC northbound API lives and how
//! the client talks to it. [`Credentials`] carries the identity exchange
//! inputs. Both are supplied by the caller at construction time.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::FetchError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default margin before expiry at which a token stops being used.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(60);

/// Path fragment of the upstream login page.
pub const DEFAULT_LOGIN_REDIRECT_MARKER: &str = "authui/login";

/// Response header carrying the issued token.
pub const DEFAULT_SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Request header carrying the session token.
pub const DEFAULT_AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Default authorization scope domain.
pub const DEFAULT_AUTH_DOMAIN: &str = "mo_bss_admin";

// ============================================================================
// Credentials
// ============================================================================

/// Identity exchange inputs.
#[derive(Clone)]
pub struct Credentials {
    /// Base URL of the IAM identity service.
    pub identity_url: Url,
    /// Account user name.
    pub username: String,
    password: String,
    /// Domain the token is scoped to.
    pub auth_domain: String,
}

impl Credentials {
    /// Creates credentials scoped to the default auth domain.
    pub fn new(identity_url: Url, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identity_url,
            username: username.into(),
            password: password.into(),
            auth_domain: DEFAULT_AUTH_DOMAIN.to_string(),
        }
    }

    /// Sets the auth domain scope.
    #[must_use]
    pub fn with_auth_domain(mut self, auth_domain: impl Into<String>) -> Self {
        self.auth_domain = auth_domain.into();
        self
    }

    /// Account password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Full URL of the token endpoint.
    pub fn token_url(&self) -> Result<Url, FetchError> {
        join_path(&self.identity_url, "/v3/auth/tokens")
    }

    /// Login request body for the password method.
    pub fn login_body(&self) -> serde_json::Value {
        serde_json::json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "domain": { "name": self.auth_domain },
                            "name": self.username,
                            "password": self.password,
                        }
                    }
                },
                "scope": {
                    "domain": { "name": self.auth_domain }
                }
            }
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity_url", &self.identity_url.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("auth_domain", &self.auth_domain)
            .finish()
    }
}

// ============================================================================
// Source Settings
// ============================================================================

/// Settings for the SC northbound client.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Base URL of the SC northbound API.
    pub sc_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Margin before token expiry at which the token is refreshed.
    pub refresh_buffer: Duration,
    /// Body substring identifying the login page.
    pub login_redirect_marker: String,
    /// Response header carrying the issued token.
    pub subject_token_header: String,
    /// Request header carrying the session token.
    pub auth_token_header: String,
    /// Hosts the client may send requests to.
    pub allowed_hosts: Vec<String>,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl SourceSettings {
    /// Creates a builder for the given SC base URL.
    pub fn builder(sc_url: Url) -> SourceSettingsBuilder {
        SourceSettingsBuilder::new(sc_url)
    }

    /// Full URL for an SC API path.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        join_path(&self.sc_url, path)
    }
}

// ============================================================================
// Source Settings Builder
// ============================================================================

/// Builder for [`SourceSettings`].
#[derive(Debug, Clone)]
pub struct SourceSettingsBuilder {
    sc_url: Url,
    identity_url: Option<Url>,
    timeout: Duration,
    refresh_buffer: Duration,
    login_redirect_marker: String,
    subject_token_header: String,
    auth_token_header: String,
    accept_invalid_certs: bool,
}

impl SourceSettingsBuilder {
    /// Creates a builder with default values.
    pub fn new(sc_url: Url) -> Self {
        Self {
            sc_url,
            identity_url: None,
            timeout: DEFAULT_TIMEOUT,
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            login_redirect_marker: DEFAULT_LOGIN_REDIRECT_MARKER.to_string(),
            subject_token_header: DEFAULT_SUBJECT_TOKEN_HEADER.to_string(),
            auth_token_header: DEFAULT_AUTH_TOKEN_HEADER.to_string(),
            accept_invalid_certs: false,
        }
    }

    /// Adds the identity service host to the allowlist.
    #[must_use]
    pub fn identity_url(mut self, url: Url) -> Self {
        self.identity_url = Some(url);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the token refresh buffer.
    #[must_use]
    pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    /// Sets the login page marker.
    #[must_use]
    pub fn login_redirect_marker(mut self, marker: impl Into<String>) -> Self {
        self.login_redirect_marker = marker.into();
        self
    }

    /// Sets the response header the token is read from.
    #[must_use]
    pub fn subject_token_header(mut self, header: impl Into<String>) -> Self {
        self.subject_token_header = header.into();
        self
    }

    /// Sets the request header the token is sent in.
    #[must_use]
    pub fn auth_token_header(mut self, header: impl Into<String>) -> Self {
        self.auth_token_header = header.into();
        self
    }

    /// Disables TLS certificate verification.
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builds the settings.
    pub fn build(self) -> SourceSettings {
        let allowed_hosts = std::iter::once(&self.sc_url)
            .chain(self.identity_url.as_ref())
            .filter_map(|url| url.host_str().map(str::to_string))
            .collect();

        SourceSettings {
            sc_url: self.sc_url,
            timeout: self.timeout,
            refresh_buffer: self.refresh_buffer,
            login_redirect_marker: self.login_redirect_marker,
            subject_token_header: self.subject_token_header,
            auth_token_header: self.auth_token_header,
            allowed_hosts,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

/// Appends an absolute API path to a base URL, keeping any base path prefix.
fn join_path(base: &Url, path: &str) -> Result<Url, FetchError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| FetchError::InvalidRequest(format!("Invalid URL {joined}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let settings = SourceSettings::builder(url("https://sc.example.com")).build();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.refresh_buffer, Duration::from_secs(60));
        assert_eq!(settings.login_redirect_marker, "authui/login");
        assert_eq!(settings.subject_token_header, "X-Subject-Token");
        assert_eq!(settings.allowed_hosts, vec!["sc.example.com".to_string()]);
    }

    #[test]
    fn test_builder_overrides() {
        let settings = SourceSettings::builder(url("https://sc.example.com"))
            .identity_url(url("https://iam.example.com:26335"))
            .timeout(Duration::from_secs(5))
            .refresh_buffer(Duration::ZERO)
            .build();

        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.refresh_buffer, Duration::ZERO);
        assert_eq!(
            settings.allowed_hosts,
            vec!["sc.example.com".to_string(), "iam.example.com".to_string()]
        );
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let settings = SourceSettings::builder(url("https://gw.example.com/sc/")).build();
        let endpoint = settings.endpoint("/rest/vdc/v3.0/vdcs").unwrap();
        assert_eq!(endpoint.as_str(), "https://gw.example.com/sc/rest/vdc/v3.0/vdcs");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new(url("https://iam.example.com"), "bss_admin", "s3cret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(creds.auth_domain, "mo_bss_admin");
    }

    #[test]
    fn test_login_body_shape() {
        let creds = Credentials::new(url("https://iam.example.com"), "bss_admin", "s3cret")
            .with_auth_domain("tenant_a");
        let body = creds.login_body();

        assert_eq!(body["auth"]["identity"]["methods"][0], "password");
        assert_eq!(body["auth"]["identity"]["password"]["user"]["name"], "bss_admin");
        assert_eq!(
            body["auth"]["identity"]["password"]["user"]["domain"]["name"],
            "tenant_a"
        );
        assert_eq!(body["auth"]["scope"]["domain"]["name"], "tenant_a");
        assert_eq!(
            creds.token_url().unwrap().as_str(),
            "https://iam.example.com/v3/auth/tokens"
        );
    }
}
