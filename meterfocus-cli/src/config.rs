//! Application configuration.
//!
//! Loaded from `<config_dir>/meterfocus/config.json`, then overridden by
//! environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use meterfocus_fetch::{Credentials, SourceClient, SourceSettings};
use meterfocus_transform::MapperSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

const REDACTED: &str = "********";

// ============================================================================
// Log Format
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    #[default]
    Console,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "console" | "text" => Ok(Self::Console),
            other => bail!("LOG_FORMAT must be json or console, got '{other}'"),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Console => f.write_str("console"),
        }
    }
}

// ============================================================================
// App Config
// ============================================================================

/// Effective CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// IAM identity base URL.
    #[serde(default)]
    pub iam_domain: String,
    /// IAM user name.
    #[serde(default)]
    pub iam_username: String,
    /// IAM password.
    #[serde(default)]
    pub iam_password: String,
    /// Domain the token is scoped to.
    #[serde(default = "default_auth_domain")]
    pub iam_auth_domain: String,
    /// SC northbound base URL.
    #[serde(default)]
    pub sc_domain: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub sc_api_timeout: u64,
    /// Billing currency (ISO 4217).
    #[serde(default = "default_currency")]
    pub billing_currency: String,
    /// Skip TLS certificate verification for on-premise endpoints.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Log level used when `--verbose` is not given.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_auth_domain() -> String {
    meterfocus_fetch::settings::DEFAULT_AUTH_DOMAIN.to_string()
}

fn default_timeout() -> u64 {
    meterfocus_fetch::settings::DEFAULT_TIMEOUT.as_secs()
}

fn default_currency() -> String {
    meterfocus_transform::mapper::DEFAULT_BILLING_CURRENCY.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            iam_domain: String::new(),
            iam_username: String::new(),
            iam_password: String::new(),
            iam_auth_domain: default_auth_domain(),
            sc_domain: String::new(),
            sc_api_timeout: default_timeout(),
            billing_currency: default_currency(),
            accept_invalid_certs: false,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meterfocus")
            .join("config.json")
    }

    /// Loads the file at `path` (defaults if absent) and applies the
    /// process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overrides fields from environment variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let strings: [(&str, &mut String); 7] = [
            ("IAM_DOMAIN", &mut self.iam_domain),
            ("IAM_USERNAME", &mut self.iam_username),
            ("IAM_PASSWORD", &mut self.iam_password),
            ("IAM_AUTH_DOMAIN", &mut self.iam_auth_domain),
            ("SC_DOMAIN", &mut self.sc_domain),
            ("BILLING_CURRENCY", &mut self.billing_currency),
            ("LOG_LEVEL", &mut self.log_level),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(value) = lookup("SC_API_TIMEOUT") {
            self.sc_api_timeout = value
                .trim()
                .parse()
                .with_context(|| format!("SC_API_TIMEOUT must be whole seconds, got '{value}'"))?;
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            self.log_format = value.parse()?;
        }
        Ok(())
    }

    /// Copy with the password masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.iam_password.is_empty() {
            copy.iam_password = REDACTED.to_string();
        }
        copy
    }

    /// Builds the upstream client.
    pub fn source_client(&self) -> Result<SourceClient> {
        let iam = parse_base_url("IAM_DOMAIN", &self.iam_domain)?;
        let sc = parse_base_url("SC_DOMAIN", &self.sc_domain)?;
        if self.iam_username.is_empty() || self.iam_password.is_empty() {
            bail!("IAM_USERNAME and IAM_PASSWORD must be set");
        }

        let settings = SourceSettings::builder(sc)
            .identity_url(iam.clone())
            .timeout(Duration::from_secs(self.sc_api_timeout))
            .accept_invalid_certs(self.accept_invalid_certs)
            .build();
        let credentials = Credentials::new(iam, &self.iam_username, &self.iam_password)
            .with_auth_domain(&self.iam_auth_domain);

        Ok(SourceClient::new(settings, credentials)?)
    }

    /// Mapper constants.
    pub fn mapper_settings(&self) -> MapperSettings {
        MapperSettings::default().with_currency(&self.billing_currency)
    }
}

fn parse_base_url(name: &str, value: &str) -> Result<Url> {
    if value.trim().is_empty() {
        bail!("{name} is not configured");
    }
    Url::parse(value.trim()).with_context(|| format!("{name} is not a valid URL: '{value}'"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.iam_auth_domain, "mo_bss_admin");
        assert_eq!(config.sc_api_timeout, 30);
        assert_eq!(config.billing_currency, "NGN");
        assert_eq!(config.log_format, LogFormat::Console);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sc_domain": "https://sc.example.com", "sc_api_timeout": 10}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.sc_domain, "https://sc.example.com");
        assert_eq!(config.sc_api_timeout, 10);
        assert_eq!(config.billing_currency, "NGN");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("IAM_DOMAIN", "https://iam.example.com"),
                ("IAM_PASSWORD", "s3cret"),
                ("SC_API_TIMEOUT", "45"),
                ("LOG_FORMAT", "json"),
                ("BILLING_CURRENCY", "USD"),
            ]))
            .unwrap();

        assert_eq!(config.iam_domain, "https://iam.example.com");
        assert_eq!(config.iam_password, "s3cret");
        assert_eq!(config.sc_api_timeout, 45);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.mapper_settings().billing_currency, "USD");
    }

    #[test]
    fn test_bad_timeout_env_is_error() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("SC_API_TIMEOUT", "soon")])).is_err());
    }

    #[test]
    fn test_redacted_hides_password() {
        let config = AppConfig {
            iam_password: "s3cret".to_string(),
            ..AppConfig::default()
        };
        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn test_source_client_requires_endpoints() {
        let err = AppConfig::default().source_client().unwrap_err();
        assert!(err.to_string().contains("IAM_DOMAIN"));
    }

    #[test]
    fn test_source_client_builds() {
        let config = AppConfig {
            iam_domain: "https://iam.example.com:26335".to_string(),
            sc_domain: "https://sc.example.com".to_string(),
            iam_username: "bss_admin".to_string(),
            iam_password: "s3cret".to_string(),
            ..AppConfig::default()
        };
        let client = config.source_client().unwrap();
        assert_eq!(client.settings().timeout, Duration::from_secs(30));
        assert_eq!(client.settings().allowed_hosts.len(), 2);
    }
}
