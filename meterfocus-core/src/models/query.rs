//! Query parameter types.
//!
//! These carry what a caller asks for; the fetch crate turns them into
//! request bodies and query strings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Largest page size the SC API accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default time zone sent with metering queries.
pub const DEFAULT_TIME_ZONE: &str = "Africa/Lagos";

/// Default locale sent with metering queries.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Locales the metering endpoint accepts.
pub const SUPPORTED_LOCALES: &[&str] = &["en_US", "zh_CN"];

// ============================================================================
// Period
// ============================================================================

/// Metering aggregation granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// One record per hour.
    Hourly,
    /// One record per day.
    #[default]
    Daily,
    /// One record per month.
    Monthly,
}

impl Period {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => Err(CoreError::InvalidQuery(format!(
                "period must be hourly, daily or monthly, got '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Metrics Query
// ============================================================================

/// Parameters for one metering query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsQuery {
    /// Region ID (e.g. `lagos-mtn-1`).
    pub region_code: String,
    /// Tenant / VDC domain ID.
    pub domain_id: String,
    /// Window start, `YYYY-MM-DD HH:MM:SS`.
    pub start_time: String,
    /// Window end, `YYYY-MM-DD HH:MM:SS`.
    pub end_time: String,
    /// Aggregation granularity.
    #[serde(default)]
    pub period: Period,
    /// Time zone name.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// `en_US` or `zh_CN`.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Resource type filter; `None` queries every type.
    #[serde(default)]
    pub resource_type_code: Option<String>,
    /// Page size (1-1000); `None` lets the server pick its default.
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl MetricsQuery {
    /// Creates a query with default period, time zone and locale.
    pub fn new(
        region_code: impl Into<String>,
        domain_id: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            region_code: region_code.into(),
            domain_id: domain_id.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            period: Period::default(),
            time_zone: default_time_zone(),
            locale: default_locale(),
            resource_type_code: None,
            limit: None,
        }
    }

    /// Sets the resource type filter.
    pub fn with_resource_type(mut self, code: impl Into<String>) -> Self {
        self.resource_type_code = Some(code.into());
        self
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the period.
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    /// Checks required fields, the locale and the page size range.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("region_code", &self.region_code),
            ("domain_id", &self.domain_id),
            ("start_time", &self.start_time),
            ("end_time", &self.end_time),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidQuery(format!("{name} is required")));
            }
        }
        if !SUPPORTED_LOCALES.contains(&self.locale.as_str()) {
            return Err(CoreError::InvalidQuery(format!(
                "locale must be one of {}, got '{}'",
                SUPPORTED_LOCALES.join(", "),
                self.locale
            )));
        }
        if let Some(limit) = self.limit {
            check_page_size(limit)?;
        }
        Ok(())
    }

    /// Parameters echoed into the transform envelope's metadata block.
    pub fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut meta = BTreeMap::new();
        meta.insert("region_code".to_string(), self.region_code.clone().into());
        meta.insert("domain_id".to_string(), self.domain_id.clone().into());
        meta.insert(
            "resource_type_code".to_string(),
            self.resource_type_code.clone().into(),
        );
        meta.insert("period".to_string(), self.period.as_str().into());
        meta.insert("start_time".to_string(), self.start_time.clone().into());
        meta.insert("end_time".to_string(), self.end_time.clone().into());
        meta.insert("time_zone".to_string(), self.time_zone.clone().into());
        meta.insert("locale".to_string(), self.locale.clone().into());
        if let Some(limit) = self.limit {
            meta.insert("limit".to_string(), limit.into());
        }
        meta
    }
}

fn check_page_size(limit: u32) -> Result<(), CoreError> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(CoreError::InvalidQuery(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
        )));
    }
    Ok(())
}

// ============================================================================
// VDC Query
// ============================================================================

/// Filters for the VDC list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VdcQuery {
    /// Page size (1-1000).
    #[serde(default = "default_vdc_limit")]
    pub limit: u32,
    /// VDC level (1-5).
    #[serde(default)]
    pub level: Option<u8>,
    /// `Some(true)` for tenants only, `Some(false)` for non-tenants only.
    #[serde(default)]
    pub is_domain: Option<bool>,
    /// Name filter.
    #[serde(default)]
    pub name: Option<String>,
    /// Tenant domain ID filter.
    #[serde(default)]
    pub domain_id: Option<String>,
}

fn default_vdc_limit() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for VdcQuery {
    fn default() -> Self {
        Self {
            limit: default_vdc_limit(),
            level: None,
            is_domain: None,
            name: None,
            domain_id: None,
        }
    }
}

impl VdcQuery {
    /// Checks the page size and level ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        check_page_size(self.limit)?;
        if let Some(level) = self.level {
            if !(1..=5).contains(&level) {
                return Err(CoreError::InvalidQuery(format!(
                    "level must be between 1 and 5, got {level}"
                )));
            }
        }
        Ok(())
    }

    /// Filter parameters, excluding the paging pair.
    pub fn filters(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(level) = self.level {
            params.push(("level", level.to_string()));
        }
        if let Some(is_domain) = self.is_domain {
            params.push(("is_domain", if is_domain { "1" } else { "0" }.to_string()));
        }
        if let Some(name) = &self.name {
            params.push(("name", name.clone()));
        }
        if let Some(domain_id) = &self.domain_id {
            params.push(("domain_id", domain_id.clone()));
        }
        params
    }
}

// ============================================================================
// Account Context
// ============================================================================

/// Tenant/VDC identity stamped onto every mapped row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    /// Tenant name → BillingAccountName.
    #[serde(default)]
    pub tenant_name: String,
    /// Tenant ID → BillingAccountId.
    #[serde(default)]
    pub tenant_id: String,
    /// VDC name → SubAccountName.
    #[serde(default)]
    pub vdc_name: String,
    /// VDC ID → SubAccountId fallback.
    #[serde(default)]
    pub vdc_id: String,
}

impl AccountContext {
    /// Creates a context.
    pub fn new(
        tenant_name: impl Into<String>,
        tenant_id: impl Into<String>,
        vdc_name: impl Into<String>,
        vdc_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_name: tenant_name.into(),
            tenant_id: tenant_id.into(),
            vdc_name: vdc_name.into(),
            vdc_id: vdc_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> MetricsQuery {
        MetricsQuery::new("lagos-mtn-1", "dom-1", "2025-04-01 00:00:00", "2025-04-02 00:00:00")
    }

    #[test]
    fn test_locale_must_be_supported() {
        let mut q = query();
        q.locale = "zh_CN".to_string();
        assert!(q.validate().is_ok());

        q.locale = "fr_FR".to_string();
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("fr_FR"));

        q.locale = "en_us".to_string();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_metrics_query_defaults() {
        let q = query();
        assert_eq!(q.period, Period::Daily);
        assert_eq!(q.time_zone, "Africa/Lagos");
        assert_eq!(q.locale, "en_US");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_metrics_query_rejects_blank_region() {
        let mut q = query();
        q.region_code = "  ".to_string();
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("region_code"));
    }

    #[test]
    fn test_metrics_query_limit_range() {
        assert!(query().with_limit(1).validate().is_ok());
        assert!(query().with_limit(1000).validate().is_ok());
        assert!(query().with_limit(0).validate().is_err());
        assert!(query().with_limit(1001).validate().is_err());
    }

    #[test]
    fn test_metadata_echoes_query() {
        let meta = query().with_resource_type("hws.resource.type.volume").metadata();
        assert_eq!(meta["region_code"], "lagos-mtn-1");
        assert_eq!(meta["resource_type_code"], "hws.resource.type.volume");
        assert_eq!(meta["period"], "daily");
        assert!(!meta.contains_key("limit"));
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("HOURLY".parse::<Period>().unwrap(), Period::Hourly);
        assert_eq!("monthly".parse::<Period>().unwrap(), Period::Monthly);
        assert!("weekly".parse::<Period>().is_err());
    }

    #[test]
    fn test_vdc_query_filters() {
        let q = VdcQuery {
            level: Some(1),
            is_domain: Some(true),
            ..VdcQuery::default()
        };
        assert!(q.validate().is_ok());
        assert_eq!(
            q.filters(),
            vec![("level", "1".to_string()), ("is_domain", "1".to_string())]
        );
    }

    #[test]
    fn test_vdc_query_level_range() {
        let q = VdcQuery {
            level: Some(6),
            ..VdcQuery::default()
        };
        assert!(q.validate().is_err());
    }
}
