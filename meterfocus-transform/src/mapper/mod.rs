//! HCS metering record → FOCUS row mapping.
//!
//! Account identity comes from the [`AccountContext`] bound at construction;
//! everything else is derived from the record itself.

mod parse;

pub use parse::{parse_charge_time, parse_tags, round_cost, safe_price, BARE_TAG_KEY, CHARGE_TIME_FORMAT};

use meterfocus_core::{AccountContext, FocusRecord, RawMetricRecord, RecordMapper};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::TransformError;

/// Default billing currency (ISO 4217).
pub const DEFAULT_BILLING_CURRENCY: &str = "NGN";

// ============================================================================
// Mapper Settings
// ============================================================================

/// Constant columns stamped onto every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperSettings {
    /// BillingCurrency and PricingCurrency.
    #[serde(default = "default_currency")]
    pub billing_currency: String,
    /// Provider.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Publisher.
    #[serde(default = "default_reseller")]
    pub publisher: String,
    /// InvoiceIssuer.
    #[serde(default = "default_reseller")]
    pub invoice_issuer: String,
}

fn default_currency() -> String {
    DEFAULT_BILLING_CURRENCY.to_string()
}

fn default_provider() -> String {
    "Huawei".to_string()
}

fn default_reseller() -> String {
    "MTN".to_string()
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            billing_currency: default_currency(),
            provider: default_provider(),
            publisher: default_reseller(),
            invoice_issuer: default_reseller(),
        }
    }
}

impl MapperSettings {
    /// Sets the billing currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.billing_currency = currency.into();
        self
    }
}

// ============================================================================
// Focus Mapper
// ============================================================================

/// Maps [`RawMetricRecord`]s into [`FocusRecord`]s for one account context.
///
/// Stateless apart from its context; build one per transform run.
#[derive(Debug, Clone)]
pub struct FocusMapper {
    context: AccountContext,
    settings: MapperSettings,
}

impl FocusMapper {
    /// Creates a mapper with default settings.
    pub fn new(context: AccountContext) -> Self {
        Self::with_settings(context, MapperSettings::default())
    }

    /// Creates a mapper with explicit settings.
    pub fn with_settings(context: AccountContext, settings: MapperSettings) -> Self {
        Self { context, settings }
    }

    /// Context bound to this mapper.
    pub fn context(&self) -> &AccountContext {
        &self.context
    }

    fn build(&self, source: &RawMetricRecord) -> Result<FocusRecord, TransformError> {
        let charge_period_start = parse_charge_time("charge_period_start", &source.start_time)?;
        let charge_period_end = parse_charge_time("charge_period_end", &source.end_time)?;

        let price = safe_price(&source.price);
        let billed_cost = round_cost(price * source.usage_value);
        if !billed_cost.is_finite() {
            return Err(TransformError::transformation(
                &source.id,
                format!(
                    "billed cost is not finite (price {price}, usage {})",
                    source.usage_value
                ),
            ));
        }

        let sub_account_id = if source.vdc_id.is_empty() {
            self.context.vdc_id.clone()
        } else {
            source.vdc_id.clone()
        };
        let currency = &self.settings.billing_currency;

        Ok(FocusRecord {
            billing_account_name: self.context.tenant_name.clone(),
            billing_account_id: self.context.tenant_id.clone(),

            sub_account_name: self.context.vdc_name.clone(),
            sub_account_id,
            sub_child_account_id: source.upper_vdc_id.clone(),
            sub_child_account_name: String::new(),

            availability_zone: source.az_code.clone(),
            region: source.region_code.clone(),
            resource_space_name: String::new(),
            resource_space_id: source.enterprise_project_id.clone(),
            resource_type: source.resource_type_code.clone(),
            resource_name: source.resource_display_name.clone(),
            resource_id: source.resource_id.clone(),
            enterprise_project_id: source.enterprise_project_id.clone(),

            tags: parse_tags(&source.tag),

            application_id: String::new(),
            application_name: String::new(),

            charge_period_start,
            charge_period_end,

            metering_metric: source.accumulate_mode.clone(),
            metering_value: source.usage_value,
            metering_unit_name: source.meter_unit_name.clone(),
            unit: source.price_unit.clone(),
            usage: source.usage_value,

            unit_price: price,
            unit_price_unit: source.price_unit.clone(),
            pricing_unit: source.price_unit.clone(),
            pricing_currency: currency.clone(),
            pricing_currency_list_unit_price: price,

            billed_cost,
            billing_currency: currency.clone(),

            consumed_unit: source.price_unit.clone(),

            provider: self.settings.provider.clone(),
            publisher: self.settings.publisher.clone(),
            invoice_issuer: self.settings.invoice_issuer.clone(),
        })
    }
}

impl RecordMapper for FocusMapper {
    type Source = RawMetricRecord;
    type Target = FocusRecord;
    type Error = TransformError;

    fn map_one(&self, source: &RawMetricRecord) -> Result<FocusRecord, TransformError> {
        self.build(source).inspect_err(|e| {
            error!(source_id = %source.id, error = %e, "Failed to map metric record");
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
