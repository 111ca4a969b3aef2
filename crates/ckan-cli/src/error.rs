//! Error types for the CKAN resource CLI
//!
//! Every variant carries a message that can be shown to the user as-is. Errors
//! that originate from a server response keep the response body so the caller
//! can print it.

use ckan_common::CommonError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Local file to upload does not exist
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Server answered with a non-success HTTP status
    #[error("Server returned {status} for '{action}'. Check the API key, dataset ID and CKAN URL.")]
    Server {
        action: String,
        status: u16,
        body: String,
    },

    /// Server answered 2xx but the action envelope reported a failure
    #[error(transparent)]
    Action(#[from] CommonError),

    /// HTTP request failed before a response was received
    #[error("Network request failed: {0}. Check your internet connection and CKAN URL.")]
    Http(#[from] reqwest::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed
    #[error("Invalid JSON response from server: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your command-line options or environment variables.")]
    Config(String),
}

impl CliError {
    /// Create a server error from a failed response
    pub fn server(action: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            action: action.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Response body returned by the server, if this error carries one
    pub fn server_body(&self) -> Option<&str> {
        match self {
            Self::Server { body, .. } if !body.trim().is_empty() => Some(body.as_str()),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
