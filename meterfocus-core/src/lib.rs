// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `meterfocus` Core
//!
//! Core types, models, and traits shared by the `meterfocus` crates.
//!
//! This crate has no I/O. It defines:
//!
//! - Source models returned by the HCS ManageOne SC Northbound Interface
//! - The FOCUS output row and the transform envelope
//! - Query parameter types and their validation
//! - Mapping errors and the [`RecordMapper`] trait
//!
//! ## Key Types
//!
//! ### Source Types
//! - [`RawMetricRecord`] - One metering record (CDR) as returned upstream
//! - [`Region`] / [`Vdc`] - Catalog entities used as lookup context
//! - [`MetricsPage`], [`RegionsPage`], [`VdcsPage`] - Page envelopes
//! - [`Page`] / [`PageEnvelope`] - Endpoint-independent page shape
//!
//! ### Output Types
//! - [`FocusRecord`] - A normalised FOCUS cost/usage row
//! - [`TransformEnvelope`] - Status, count, records and request metadata
//!
//! ### Queries
//! - [`MetricsQuery`] - Metering query window and filters
//! - [`VdcQuery`] - VDC list filters
//! - [`AccountContext`] - Tenant/VDC identity bound into mapped rows

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::{error_body, CoreError, MappingError};

// Re-export all model types
pub use models::{
    // Source types
    AccumulationMode,
    LocalizedName,
    MetricsPage,
    Page,
    PageEnvelope,
    RawMetricRecord,
    Region,
    RegionsPage,
    Vdc,
    VdcsPage,
    // Output types
    FocusRecord,
    TransformEnvelope,
    // Queries
    AccountContext,
    MetricsQuery,
    Period,
    VdcQuery,
    DEFAULT_LOCALE,
    DEFAULT_TIME_ZONE,
    MAX_PAGE_SIZE,
    SUPPORTED_LOCALES,
};

// Re-export traits
pub use traits::RecordMapper;
