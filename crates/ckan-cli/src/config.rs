//! Connection settings for the CKAN action API

use crate::error::{CliError, Result};
use std::time::Duration;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default per-request timeout in seconds.
/// Can be overridden via `--api-timeout` or the CKAN_API_TIMEOUT_SECS environment variable.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Validated client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    ckan_url: String,
    api_timeout: Duration,
}

impl Config {
    /// Create a config for the given CKAN base URL
    ///
    /// The URL must use http or https; a trailing slash is removed.
    pub fn new(ckan_url: impl Into<String>) -> Result<Self> {
        let ckan_url = ckan_url.into();
        let trimmed = ckan_url.trim().trim_end_matches('/');

        if trimmed.is_empty() {
            return Err(CliError::config("CKAN URL must not be empty"));
        }

        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(CliError::config(format!(
                "CKAN URL '{}' must start with http:// or https://",
                ckan_url
            )));
        }

        Ok(Self {
            ckan_url: trimmed.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        })
    }

    pub fn with_api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    pub fn ckan_url(&self) -> &str {
        &self.ckan_url
    }

    pub fn api_timeout(&self) -> Duration {
        self.api_timeout
    }
}
