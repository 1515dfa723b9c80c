//! Upstream source types.
//!
//! Field names match the JSON keys returned by the SC Northbound Interface:
//! - [`RawMetricRecord`] - One metering record from `query-metrics-data`
//! - [`Region`] - Region catalog entry
//! - [`Vdc`] - VDC (tenant hierarchy) entry

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Raw Metric Record
// ============================================================================

/// A single metering record (CDR) from the metrics query endpoint.
///
/// Only `id`, `start_time` and `end_time` are required on the wire; every
/// other field defaults to empty or zero. Unknown keys are kept in
/// [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricRecord {
    /// Unique metric record ID.
    pub id: String,
    /// Record type code.
    #[serde(default)]
    pub record_type: String,
    /// Project / resource owner ID.
    #[serde(default)]
    pub user_id: String,
    /// Region identifier.
    #[serde(default)]
    pub region_code: String,
    /// Cloud infrastructure ID.
    #[serde(default)]
    pub cloud_infra_id: String,
    /// Availability zone code (e.g. `az5.dc5`).
    #[serde(default)]
    pub az_code: String,
    /// Cloud service type (e.g. `hws.service.type.evs`).
    #[serde(default)]
    pub cloud_service_type_code: String,
    /// Resource type (e.g. `hws.resource.type.volume`).
    #[serde(default)]
    pub resource_type_code: String,
    /// Resource spec (e.g. `IPSAN`).
    #[serde(default)]
    pub resource_spec_code: String,
    /// Unique resource identifier.
    #[serde(default)]
    pub resource_id: String,
    /// Human-readable resource name.
    #[serde(default)]
    pub resource_display_name: String,
    /// BSS parameter string.
    #[serde(default)]
    pub bss_params: String,
    /// Usage period start, `YYYY-MM-DD HH:MM:SS`.
    pub start_time: String,
    /// Usage period end, `YYYY-MM-DD HH:MM:SS`.
    pub end_time: String,
    /// Resource tags as a raw string.
    #[serde(default)]
    pub tag: String,
    /// Parent VDC ID.
    #[serde(default)]
    pub upper_vdc_id: String,
    /// VDC the resource belongs to.
    #[serde(default)]
    pub vdc_id: String,
    /// Enterprise project ID.
    #[serde(default)]
    pub enterprise_project_id: String,
    /// Metering unit ID.
    #[serde(default)]
    pub meter_unit_id: String,
    /// Metering unit name.
    #[serde(default)]
    pub meter_unit_name: String,
    /// Extended parameters.
    #[serde(default)]
    pub extend_params: String,
    /// Metering method (e.g. `hour`).
    #[serde(default)]
    pub meter_ways: String,
    /// Billing item / spec name.
    #[serde(default)]
    pub spec_define_name: String,
    /// Unit price, string-encoded upstream.
    #[serde(default = "default_price", deserialize_with = "string_or_number")]
    pub price: String,
    /// Usage duration in seconds.
    #[serde(default)]
    pub usage_duration: i64,
    /// `DURATION` (time-based) or `USAGE` (count-based).
    #[serde(default)]
    pub accumulate_mode: String,
    /// Spec definition ID.
    #[serde(default)]
    pub spec_define_id: String,
    /// Price unit (e.g. `GB`).
    #[serde(default)]
    pub price_unit: String,
    /// Cumulative usage value.
    #[serde(default)]
    pub usage_value: f64,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_price() -> String {
    "0".to_string()
}

/// Accepts a price sent either as a JSON string or as a bare number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null => default_price(),
    })
}

impl RawMetricRecord {
    /// Creates a record with the required fields and everything else empty.
    pub fn new(
        id: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            record_type: String::new(),
            user_id: String::new(),
            region_code: String::new(),
            cloud_infra_id: String::new(),
            az_code: String::new(),
            cloud_service_type_code: String::new(),
            resource_type_code: String::new(),
            resource_spec_code: String::new(),
            resource_id: String::new(),
            resource_display_name: String::new(),
            bss_params: String::new(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            tag: String::new(),
            upper_vdc_id: String::new(),
            vdc_id: String::new(),
            enterprise_project_id: String::new(),
            meter_unit_id: String::new(),
            meter_unit_name: String::new(),
            extend_params: String::new(),
            meter_ways: String::new(),
            spec_define_name: String::new(),
            price: default_price(),
            usage_duration: 0,
            accumulate_mode: String::new(),
            spec_define_id: String::new(),
            price_unit: String::new(),
            usage_value: 0.0,
            extra: BTreeMap::new(),
        }
    }

    /// Parses the accumulation mode string.
    pub fn accumulation_mode(&self) -> AccumulationMode {
        AccumulationMode::parse(&self.accumulate_mode)
    }
}

// ============================================================================
// Accumulation Mode
// ============================================================================

/// Whether a metered quantity accrues over time or per use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumulationMode {
    /// Time accrued (`DURATION`).
    Duration,
    /// Count accrued (`USAGE`).
    Usage,
    /// Anything else the upstream sends, kept verbatim.
    Other(String),
}

impl AccumulationMode {
    /// Parses an upstream value, case-insensitively.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DURATION" => Self::Duration,
            "USAGE" => Self::Usage,
            _ => Self::Other(value.to_string()),
        }
    }

    /// Returns true for duration-based metering.
    pub fn is_duration(&self) -> bool {
        matches!(self, Self::Duration)
    }
}

impl fmt::Display for AccumulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration => write!(f, "DURATION"),
            Self::Usage => write!(f, "USAGE"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

// ============================================================================
// Region
// ============================================================================

/// Region names come back either as a plain string or per locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedName {
    /// A single name.
    Plain(String),
    /// Localised names keyed by locale code (`en_us`, `zh_cn`, ...).
    Localized(BTreeMap<String, String>),
}

impl Default for LocalizedName {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl LocalizedName {
    /// Returns the name for `locale`, falling back to English and then to
    /// any available value.
    pub fn display(&self, locale: &str) -> &str {
        match self {
            Self::Plain(name) => name,
            Self::Localized(names) => {
                let wanted = locale.to_ascii_lowercase();
                names
                    .get(&wanted)
                    .or_else(|| names.get("en_us"))
                    .or_else(|| names.values().next())
                    .map_or("", String::as_str)
            }
        }
    }
}

/// A region from the regions catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Region ID (e.g. `lagos-mtn-1`).
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: LocalizedName,
    /// Region type reported upstream.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub region_type: Option<String>,
    /// Parent region, if the catalog is hierarchical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Lifecycle status (e.g. `normal`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Region {
    /// Returns true unless the upstream marks the region as not normal.
    pub fn is_enabled(&self) -> bool {
        self.status
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("normal"))
    }
}

// ============================================================================
// VDC
// ============================================================================

/// A VDC (tenant or sub-tenant) from the VDC hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vdc {
    /// VDC ID.
    pub id: String,
    /// VDC name.
    #[serde(default)]
    pub name: String,
    /// Hierarchy level (1 = tenant).
    #[serde(default)]
    pub level: Option<u8>,
    /// Parent VDC ID.
    #[serde(default)]
    pub upper_vdc_id: Option<String>,
    /// Owning tenant domain ID.
    #[serde(default)]
    pub domain_id: Option<String>,
    /// Owning tenant domain name.
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Whether the VDC is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl Vdc {
    /// Returns true for first-level VDCs (tenants).
    pub fn is_tenant(&self) -> bool {
        self.level == Some(1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_minimal_defaults() {
        let json = r#"{
            "id": "rec-1",
            "start_time": "2025-04-01 00:00:00",
            "end_time": "2025-04-02 00:00:00"
        }"#;

        let record: RawMetricRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "rec-1");
        assert_eq!(record.price, "0");
        assert_eq!(record.usage_value, 0.0);
        assert!(record.tag.is_empty());
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_raw_record_missing_id_rejected() {
        let json = r#"{"start_time": "2025-04-01 00:00:00", "end_time": "2025-04-02 00:00:00"}"#;
        assert!(serde_json::from_str::<RawMetricRecord>(json).is_err());
    }

    #[test]
    fn test_raw_record_numeric_price() {
        let json = r#"{
            "id": "rec-1",
            "start_time": "2025-04-01 00:00:00",
            "end_time": "2025-04-02 00:00:00",
            "price": 0.25
        }"#;

        let record: RawMetricRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.price, "0.25");
    }

    #[test]
    fn test_raw_record_keeps_unknown_fields() {
        let json = r#"{
            "id": "rec-1",
            "start_time": "2025-04-01 00:00:00",
            "end_time": "2025-04-02 00:00:00",
            "charging_mode": "on_demand"
        }"#;

        let record: RawMetricRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.extra.get("charging_mode"),
            Some(&serde_json::json!("on_demand"))
        );
    }

    #[test]
    fn test_accumulation_mode_parse() {
        assert_eq!(AccumulationMode::parse("DURATION"), AccumulationMode::Duration);
        assert_eq!(AccumulationMode::parse("usage"), AccumulationMode::Usage);
        assert_eq!(
            AccumulationMode::parse("PEAK"),
            AccumulationMode::Other("PEAK".to_string())
        );
        assert!(AccumulationMode::Duration.is_duration());
    }

    #[test]
    fn test_region_localized_name() {
        let json = r#"{
            "id": "lagos-mtn-1",
            "name": {"zh_cn": "拉各斯", "en_us": "Lagos"},
            "type": "private_cloud",
            "status": "normal"
        }"#;

        let region: Region = serde_json::from_str(json).unwrap();
        assert_eq!(region.name.display("en_US"), "Lagos");
        assert_eq!(region.name.display("zh_CN"), "拉各斯");
        assert_eq!(region.region_type.as_deref(), Some("private_cloud"));
        assert!(region.is_enabled());
    }

    #[test]
    fn test_region_plain_name() {
        let region: Region = serde_json::from_str(r#"{"id": "r1", "name": "Abuja"}"#).unwrap();
        assert_eq!(region.name.display("en_US"), "Abuja");
        assert!(region.is_enabled());
    }

    #[test]
    fn test_vdc_defaults() {
        let vdc: Vdc = serde_json::from_str(r#"{"id": "v1", "name": "finops", "level": 1}"#).unwrap();
        assert!(vdc.enabled);
        assert!(vdc.is_tenant());
        assert!(vdc.upper_vdc_id.is_none());
    }
}
