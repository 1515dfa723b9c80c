//! Host APIs.
//!
//! - [`http`] - HTTP client with tracing and host allowlist

pub mod http;

pub use http::{HttpClient, HttpResponse, PageCall};
