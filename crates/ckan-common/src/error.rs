//! Error types shared across the CKAN tools

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while interpreting CKAN action responses
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Action '{action}' was rejected by the server: {message}")]
    ActionFailed { action: String, message: String },

    #[error("Action '{action}' returned no result")]
    MissingResult { action: String },
}

impl CommonError {
    /// Create an action failure error
    pub fn action_failed(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ActionFailed {
            action: action.into(),
            message: message.into(),
        }
    }
}
