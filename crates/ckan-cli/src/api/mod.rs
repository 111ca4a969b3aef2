//! API client module
//!
//! HTTP client for the CKAN action API (`/api/3/action/*`).

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{CatalogApi, CkanClient};
pub use types::*;
