//! FOCUS output types.
//!
//! - [`FocusRecord`] - One row in FOCUS (FinOps Open Cost & Usage
//!   Specification) shape, mapped from a [`RawMetricRecord`]
//! - [`TransformEnvelope`] - The response for one transform request
//!
//! [`RawMetricRecord`]: super::RawMetricRecord

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Focus Record
// ============================================================================

/// A single FOCUS cost/usage row.
///
/// `billing_account_id`, `sub_account_id`, both charge-period bounds and
/// `billed_cost` are non-nullable columns and are never `Option`s here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusRecord {
    // ── Account (tenant → billing account) ──────────────────────────
    /// BillingAccountName, from the tenant name.
    pub billing_account_name: String,
    /// BillingAccountId, from the tenant ID.
    pub billing_account_id: String,

    // ── Sub account (VDC → sub account) ─────────────────────────────
    /// SubAccountName, from the VDC name.
    pub sub_account_name: String,
    /// SubAccountId, from the record's VDC or the context VDC.
    pub sub_account_id: String,
    /// SubChildAccountId, from the parent VDC ID.
    pub sub_child_account_id: String,
    /// SubChildAccountName.
    pub sub_child_account_name: String,

    // ── Resource ────────────────────────────────────────────────────
    /// AvailabilityZone.
    pub availability_zone: String,
    /// Region.
    pub region: String,
    /// ResourceSpaceName.
    pub resource_space_name: String,
    /// ResourceSpaceId, from the enterprise project.
    pub resource_space_id: String,
    /// ResourceType.
    pub resource_type: String,
    /// ResourceName.
    pub resource_name: String,
    /// ResourceId.
    pub resource_id: String,
    /// EnterpriseProjectId.
    pub enterprise_project_id: String,

    /// Tags, parsed into key/value pairs.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    // ── Application ─────────────────────────────────────────────────
    /// ApplicationId.
    pub application_id: String,
    /// ApplicationName.
    pub application_name: String,

    // ── Charge period ───────────────────────────────────────────────
    /// ChargePeriodStart (UTC).
    pub charge_period_start: DateTime<Utc>,
    /// ChargePeriodEnd (UTC).
    pub charge_period_end: DateTime<Utc>,

    // ── Metering ────────────────────────────────────────────────────
    /// MeteringMetric, from the accumulation mode.
    pub metering_metric: String,
    /// MeteringValue.
    pub metering_value: f64,
    /// MeteringUnitName.
    pub metering_unit_name: String,
    /// Unit.
    pub unit: String,
    /// Usage.
    pub usage: f64,

    // ── Pricing ─────────────────────────────────────────────────────
    /// UnitPrice.
    pub unit_price: f64,
    /// UnitPriceUnit.
    pub unit_price_unit: String,
    /// PricingUnit.
    pub pricing_unit: String,
    /// PricingCurrency.
    pub pricing_currency: String,
    /// PricingCurrencyListUnitPrice.
    pub pricing_currency_list_unit_price: f64,

    // ── Cost ────────────────────────────────────────────────────────
    /// BilledCost, `round(unit_price * usage, 6)`.
    pub billed_cost: f64,
    /// BillingCurrency (ISO 4217).
    pub billing_currency: String,

    /// ConsumedUnit.
    pub consumed_unit: String,

    // ── Provider ────────────────────────────────────────────────────
    /// Provider.
    pub provider: String,
    /// Publisher.
    pub publisher: String,
    /// InvoiceIssuer.
    pub invoice_issuer: String,
}

impl FocusRecord {
    /// Length of the charge period.
    pub fn charge_period(&self) -> chrono::Duration {
        self.charge_period_end - self.charge_period_start
    }
}

// ============================================================================
// Transform Envelope
// ============================================================================

/// Status value for a successful transform.
const STATUS_OK: &str = "ok";

/// Result of one transform request.
///
/// Built once, read-only afterwards: `total_count` always equals the number
/// of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformEnvelope {
    status: String,
    total_count: usize,
    records: Vec<FocusRecord>,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl TransformEnvelope {
    /// Creates a successful envelope.
    pub fn ok(records: Vec<FocusRecord>, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            total_count: records.len(),
            records,
            metadata,
        }
    }

    /// Status flag (`"ok"`).
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Number of records.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Mapped records, in upstream order.
    pub fn records(&self) -> &[FocusRecord] {
        &self.records
    }

    /// Query parameters that produced this batch.
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Sum of `billed_cost` across all records.
    pub fn total_billed_cost(&self) -> f64 {
        self.records.iter().map(|r| r.billed_cost).sum()
    }

    /// Consumes the envelope, returning the records.
    pub fn into_records(self) -> Vec<FocusRecord> {
        self.records
    }
}
