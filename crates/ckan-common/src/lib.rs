//! CKAN Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared catalog types, envelope decoding and logging for the CKAN resource tools.
//!
//! # Overview
//!
//! - **Types**: resource, dataset (package) and task status records as returned
//!   by the CKAN action API, plus the `{success, result, error}` envelope
//! - **Errors**: envelope decoding failures
//! - **Logging**: `tracing` subscriber setup shared by all binaries
//!
//! # Example
//!
//! ```no_run
//! use ckan_common::types::{ActionResponse, Package};
//!
//! fn first_resource_name(body: &str) -> ckan_common::Result<Option<String>> {
//!     let response: ActionResponse<Package> = serde_json::from_str(body)?;
//!     let package = response.into_result("package_show")?;
//!     Ok(package.resources.first().and_then(|r| r.name.clone()))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CommonError, Result};
