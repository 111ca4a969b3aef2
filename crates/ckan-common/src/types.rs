//! Catalog records exchanged with the CKAN action API
//!
//! Only the fields the resource tools read are modelled; everything else in the
//! server payload is ignored during deserialization.

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Action Envelope
// ============================================================================

/// Standard CKAN action response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl<T> ActionResponse<T> {
    /// Unwrap the envelope, turning `success: false` into an error
    pub fn into_result(self, action: &str) -> Result<T> {
        if !self.success {
            let message = self
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no error details returned".to_string());
            return Err(CommonError::action_failed(action, message));
        }

        self.result.ok_or_else(|| CommonError::MissingResult {
            action: action.to_string(),
        })
    }

    /// Check the success flag only, for actions whose result carries nothing useful
    pub fn ensure_success(self, action: &str) -> Result<()> {
        if self.success {
            return Ok(());
        }

        let message = self
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no error details returned".to_string());
        Err(CommonError::action_failed(action, message))
    }
}

/// Error object carried in a failed action response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionError {
    #[serde(rename = "__type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Validation errors keyed by field name
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.message) {
            (Some(kind), Some(message)) => write!(f, "{}: {}", kind, message)?,
            (Some(kind), None) => write!(f, "{}", kind)?,
            (None, Some(message)) => write!(f, "{}", message)?,
            (None, None) => write!(f, "unknown error")?,
        }

        if !self.fields.is_empty() {
            write!(f, " {}", serde_json::Value::Object(self.fields.clone()))?;
        }

        Ok(())
    }
}

// ============================================================================
// Resources and Datasets
// ============================================================================

/// A single file-backed asset inside a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Set by the server once the file has been loaded into the DataStore
    #[serde(default)]
    pub datastore_active: Option<bool>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Resource {
    /// Exact, case-sensitive name comparison
    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn is_datastore_active(&self) -> bool {
        self.datastore_active.unwrap_or(false)
    }

    /// Ingestion status derived from the resource record itself
    pub fn ingestion_status(&self) -> IngestionStatus {
        if self.is_datastore_active() {
            IngestionStatus::Active
        } else if self.state.as_deref() == Some("error") {
            IngestionStatus::Error
        } else {
            IngestionStatus::NotActive
        }
    }
}

/// Ingestion status as seen on a resource record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionStatus {
    Active,
    NotActive,
    Error,
}

/// A dataset (called "package" by the API) and its resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Package {
    /// First resource whose name matches exactly; duplicates are not reported
    pub fn find_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.has_name(name))
    }
}

// ============================================================================
// Background Jobs
// ============================================================================

/// Task type and key the DataPusher registers its jobs under
pub const DATAPUSHER_TASK: &str = "datapusher";

/// Status record of a server-side background task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub state: String,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl TaskStatus {
    pub fn job_state(&self) -> JobState {
        self.state.parse().unwrap_or(JobState::Running)
    }

    /// Human-readable error detail, if the server attached one
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.is_empty() || s == "{}" => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Object(map)) if map.is_empty() => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Lifecycle state reported for an ingestion job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Complete,
    Failure,
    Error,
}

impl std::str::FromStr for JobState {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "submitting" => Ok(JobState::Pending),
            "running" => Ok(JobState::Running),
            "complete" => Ok(JobState::Complete),
            "failure" | "failed" => Ok(JobState::Failure),
            "error" => Ok(JobState::Error),
            other => Err(CommonError::action_failed(
                "task_status_show",
                format!("unknown job state '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Complete => write!(f, "complete"),
            JobState::Failure => write!(f, "failure"),
            JobState::Error => write!(f, "error"),
        }
    }
}
