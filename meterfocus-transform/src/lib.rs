// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `meterfocus` Transform
//!
//! Turns HCS metering records into FOCUS cost/usage rows.
//!
//! - [`mapper::FocusMapper`] - Field-by-field record mapping
//! - [`service::TransformService`] - Authenticate, fetch, map, wrap
//! - [`error::TransformError`] - Fetch, mapping and transformation failures
//!
//! ## Example
//!
//! ```ignore
//! use meterfocus_transform::TransformService;
//!
//! let service = TransformService::new(client);
//! let mut session = service.client().new_session();
//! let envelope = service.transform(&mut session, &query, context).await?;
//! println!("{} rows", envelope.total_count());
//! ```

pub mod error;
pub mod mapper;
pub mod service;

pub use error::TransformError;
pub use mapper::{FocusMapper, MapperSettings};
pub use service::TransformService;
