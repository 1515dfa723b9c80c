//! Domain models for meterfocus.
//!
//! ## Submodules
//!
//! - [`source`] - Upstream records and catalog entities (RawMetricRecord, Region, Vdc)
//! - [`page`] - Page envelopes returned by the list and query endpoints
//! - [`focus`] - FOCUS output rows and the transform envelope
//! - [`query`] - Query parameters and account context

mod focus;
mod page;
mod query;
mod source;

// Re-export everything at the models level
pub use focus::{FocusRecord, TransformEnvelope};
pub use page::{MetricsPage, Page, PageEnvelope, RegionsPage, VdcsPage};
pub use query::{
    AccountContext, MetricsQuery, Period, VdcQuery, DEFAULT_LOCALE, DEFAULT_TIME_ZONE, MAX_PAGE_SIZE,
    SUPPORTED_LOCALES,
};
pub use source::{AccumulationMode, LocalizedName, RawMetricRecord, Region, Vdc};
