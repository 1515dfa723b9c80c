//! CLI command implementations.

pub mod config;
pub mod metrics;
pub mod regions;
pub mod transform;
pub mod vdcs;
