//! SC northbound endpoints.
//!
//! | Endpoint | Method | Envelope |
//! |----------|--------|----------|
//! | `/silvan/rest/v1.0/regions` | GET | [`RegionsPage`] |
//! | `/rest/vdc/v3.0/vdcs` | GET | [`VdcsPage`] |
//! | `/rest/metering/v3.0/query-metrics-data` | POST | [`MetricsPage`] |

use meterfocus_core::{MetricsPage, MetricsQuery, RegionsPage, VdcQuery, VdcsPage};

use crate::error::FetchError;
use crate::host::PageCall;
use crate::pagination::PageRequest;
use crate::settings::SourceSettings;

/// Regions list path.
pub const REGIONS_PATH: &str = "/silvan/rest/v1.0/regions";

/// VDC list path.
pub const VDCS_PATH: &str = "/rest/vdc/v3.0/vdcs";

/// Metering query path.
pub const METRICS_PATH: &str = "/rest/metering/v3.0/query-metrics-data";

// ============================================================================
// Regions
// ============================================================================

/// Request for the regions list.
#[derive(Debug, Clone, Default)]
pub struct RegionsRequest {
    /// Page size; `None` lets the server decide.
    pub limit: Option<u32>,
}

impl PageRequest for RegionsRequest {
    type Envelope = RegionsPage;

    fn name(&self) -> &'static str {
        "regions"
    }

    fn page_size(&self) -> Option<u32> {
        self.limit
    }

    /// The first page of an unbounded request carries no paging parameters.
    fn page_call(&self, settings: &SourceSettings, offset: u64) -> Result<PageCall, FetchError> {
        let mut url = settings.endpoint(REGIONS_PATH)?;
        if offset > 0 || self.limit.is_some() {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("start", &offset.to_string());
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(PageCall::get(url))
    }
}

// ============================================================================
// VDCs
// ============================================================================

/// Request for the VDC list.
#[derive(Debug, Clone)]
pub struct VdcsRequest {
    query: VdcQuery,
}

impl VdcsRequest {
    /// Validates the query and creates the request.
    pub fn new(query: VdcQuery) -> Result<Self, FetchError> {
        query.validate()?;
        Ok(Self { query })
    }
}

impl PageRequest for VdcsRequest {
    type Envelope = VdcsPage;

    fn name(&self) -> &'static str {
        "vdcs"
    }

    fn page_size(&self) -> Option<u32> {
        Some(self.query.limit)
    }

    fn page_call(&self, settings: &SourceSettings, offset: u64) -> Result<PageCall, FetchError> {
        let mut url = settings.endpoint(VDCS_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("start", &offset.to_string());
            pairs.append_pair("limit", &self.query.limit.to_string());
            for (key, value) in self.query.filters() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(PageCall::get(url))
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Request for metering records.
#[derive(Debug, Clone)]
pub struct MetricsRequest {
    query: MetricsQuery,
}

impl MetricsRequest {
    /// Validates the query and creates the request.
    pub fn new(query: MetricsQuery) -> Result<Self, FetchError> {
        query.validate()?;
        Ok(Self { query })
    }

    /// The query this request pages through.
    pub fn query(&self) -> &MetricsQuery {
        &self.query
    }

    /// Request body for the page starting at `offset`.
    pub fn body(&self, offset: u64) -> serde_json::Value {
        let q = &self.query;
        let mut body = serde_json::json!({
            "region_code": q.region_code,
            "start_time": q.start_time,
            "end_time": q.end_time,
            "time_zone": q.time_zone,
            "period": q.period.as_str(),
            "locale": q.locale,
            "domain_id": q.domain_id,
            "start": offset,
        });
        if let Some(code) = &q.resource_type_code {
            body["resource_type_code"] = code.clone().into();
        }
        if let Some(limit) = q.limit {
            body["limit"] = limit.into();
        }
        body
    }
}

impl PageRequest for MetricsRequest {
    type Envelope = MetricsPage;

    fn name(&self) -> &'static str {
        "metrics"
    }

    fn page_size(&self) -> Option<u32> {
        self.query.limit
    }

    fn page_call(&self, settings: &SourceSettings, offset: u64) -> Result<PageCall, FetchError> {
        let url = settings.endpoint(METRICS_PATH)?;
        Ok(PageCall::post(url, self.body(offset)))
    }
}

// ============================================================================
// Tests
// ============================================================================
