// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `meterfocus` Fetch
//!
//! Authenticated, paginating client for the HCS ManageOne SC northbound API.
//!
//! ## Components
//!
//! - [`session::TokenSession`] - Holds the current token; no I/O
//! - [`auth::Authenticator`] - IAM password login, token from response header
//! - [`pagination::PaginatedFetcher`] - Offset pagination with a single
//!   re-authentication retry on a rejected token
//! - [`client::SourceClient`] - Regions, VDCs and metering records
//! - [`host::http`] - HTTP client with tracing and host allowlist
//!
//! ## Example
//!
//! ```ignore
//! use meterfocus_fetch::{Credentials, SourceClient, SourceSettings};
//!
//! let settings = SourceSettings::builder(sc_url).identity_url(iam_url.clone()).build();
//! let client = SourceClient::new(settings, Credentials::new(iam_url, "user", "pass"))?;
//!
//! let mut session = client.new_session();
//! let regions = client.fetch_regions(&mut session).await?;
//! ```

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod host;
pub mod pagination;
pub mod session;
pub mod settings;

// Re-exports for convenience
pub use auth::{Authenticator, Reauthenticate};
pub use client::SourceClient;
pub use endpoints::{MetricsRequest, RegionsRequest, VdcsRequest};
pub use error::FetchError;
pub use host::{HttpClient, HttpResponse, PageCall};
pub use pagination::{is_login_redirect, PageRequest, PaginatedFetcher};
pub use session::{SessionState, SharedTokenSession, Token, TokenSession};
pub use settings::{Credentials, SourceSettings, SourceSettingsBuilder};
