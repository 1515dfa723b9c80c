//! Page envelopes.
//!
//! Every list/query endpoint wraps its items in an envelope carrying the
//! server-reported `total`. [`PageEnvelope`] turns each concrete envelope
//! into the endpoint-independent [`Page`] the fetch loop works with.

use serde::{Deserialize, Serialize};

use super::source::{RawMetricRecord, Region, Vdc};

// ============================================================================
// Generic Page
// ============================================================================

/// One page of items plus the server-reported total across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page, in server order.
    pub items: Vec<T>,
    /// Total number of items the server reports for the whole query.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An endpoint-specific page body.
pub trait PageEnvelope {
    /// Item type carried by the envelope.
    type Item;

    /// Converts into the generic page shape.
    fn into_page(self) -> Page<Self::Item>;
}

// ============================================================================
// Metrics
// ============================================================================

/// Envelope returned by `POST /rest/metering/v3.0/query-metrics-data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsPage {
    /// Metering records on this page.
    #[serde(default)]
    pub metrics: Vec<RawMetricRecord>,
    /// Time zone echoed by the server.
    #[serde(default)]
    pub time_zone: String,
    /// Query start echoed by the server.
    #[serde(default)]
    pub start_time: String,
    /// Query end echoed by the server.
    #[serde(default)]
    pub end_time: String,
    /// Total records across all pages.
    #[serde(default)]
    pub total: u64,
    /// Opaque server marker.
    #[serde(default)]
    pub marker: String,
}

impl PageEnvelope for MetricsPage {
    type Item = RawMetricRecord;

    fn into_page(self) -> Page<RawMetricRecord> {
        Page::new(self.metrics, self.total)
    }
}

// ============================================================================
// Regions
// ============================================================================

/// Envelope returned by `GET /silvan/rest/v1.0/regions`.
///
/// The regions endpoint may omit `total`; the page's own length stands in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionsPage {
    /// Regions on this page.
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Total regions, when reported.
    #[serde(default)]
    pub total: Option<u64>,
}

impl PageEnvelope for RegionsPage {
    type Item = Region;

    fn into_page(self) -> Page<Region> {
        let total = self.total.unwrap_or(self.regions.len() as u64);
        Page::new(self.regions, total)
    }
}

// ============================================================================
// VDCs
// ============================================================================

/// Envelope returned by `GET /rest/vdc/v3.0/vdcs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VdcsPage {
    /// VDCs on this page.
    #[serde(default)]
    pub vdcs: Vec<Vdc>,
    /// Total VDCs across all pages.
    #[serde(default)]
    pub total: u64,
}

impl PageEnvelope for VdcsPage {
    type Item = Vdc;

    fn into_page(self) -> Page<Vdc> {
        Page::new(self.vdcs, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_page_into_page() {
        let json = r#"{
            "metrics": [
                {"id": "a", "start_time": "2025-04-01 00:00:00", "end_time": "2025-04-01 01:00:00"}
            ],
            "total": 40,
            "time_zone": "Africa/Lagos"
        }"#;

        let page = serde_json::from_str::<MetricsPage>(json).unwrap().into_page();
        assert_eq!(page.len(), 1);
        assert_eq!(page.total, 40);
    }

    #[test]
    fn test_regions_page_without_total() {
        let json = r#"{"regions": [{"id": "r1", "name": "One"}, {"id": "r2", "name": "Two"}]}"#;
        let page = serde_json::from_str::<RegionsPage>(json).unwrap().into_page();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_empty_object_is_empty_page() {
        let page = serde_json::from_str::<VdcsPage>("{}").unwrap().into_page();
        assert!(page.is_empty());
        assert_eq!(page.total, 0);
    }
}
