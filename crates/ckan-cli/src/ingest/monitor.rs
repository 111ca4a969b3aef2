//! Ingestion monitors
//!
//! A monitor answers one question for the waiter: how far along is the
//! server-side ingestion of a resource? Two backends exist:
//!
//! - [`ResourceStatusMonitor`] reads the resource record and looks at its
//!   `datastore_active` flag and `state`.
//! - [`JobStatusMonitor`] reads the DataPusher task status and can re-trigger
//!   the job when it appears stuck.

use crate::api::CatalogApi;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use ckan_common::types::{IngestionStatus, JobState, DATAPUSHER_TASK};
use std::sync::Arc;

/// One observation of an ingestion job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still pending or running
    InProgress,
    Complete,
    /// The server no longer knows the job; it finished and was cleaned up
    Absent,
    Failed(String),
}

/// Polling backend used by the ingestion waiter
#[async_trait]
pub trait IngestionMonitor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Query the current ingestion status. Errors are transport-level failures.
    async fn poll(&self, resource_id: &str) -> Result<PollStatus>;

    /// Whether [`IngestionMonitor::resubmit`] is supported
    fn can_resubmit(&self) -> bool {
        false
    }

    /// Trigger the ingestion job again
    async fn resubmit(&self, resource_id: &str) -> Result<()> {
        Err(CliError::config(format!(
            "the {} monitor cannot resubmit ingestion for resource {}",
            self.name(),
            resource_id
        )))
    }
}

/// Which monitor to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MonitorKind {
    /// Poll the resource record's `datastore_active` flag
    #[default]
    ResourceStatus,
    /// Poll the DataPusher task status, resubmitting stuck jobs
    JobStatus,
}

impl MonitorKind {
    pub fn build(self, api: Arc<dyn CatalogApi>) -> Box<dyn IngestionMonitor> {
        match self {
            MonitorKind::ResourceStatus => Box::new(ResourceStatusMonitor::new(api)),
            MonitorKind::JobStatus => Box::new(JobStatusMonitor::new(api)),
        }
    }
}

impl std::fmt::Display for MonitorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorKind::ResourceStatus => write!(f, "resource-status"),
            MonitorKind::JobStatus => write!(f, "job-status"),
        }
    }
}

/// Watches the resource record itself
pub struct ResourceStatusMonitor {
    api: Arc<dyn CatalogApi>,
}

impl ResourceStatusMonitor {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IngestionMonitor for ResourceStatusMonitor {
    fn name(&self) -> &'static str {
        "resource-status"
    }

    async fn poll(&self, resource_id: &str) -> Result<PollStatus> {
        let resource = self.api.resource_show(resource_id).await?;

        Ok(match resource.ingestion_status() {
            IngestionStatus::Active => PollStatus::Complete,
            IngestionStatus::Error => PollStatus::Failed(
                "DataStore import failed. Please check the resource on CKAN.".to_string(),
            ),
            IngestionStatus::NotActive => PollStatus::InProgress,
        })
    }
}

/// Watches the DataPusher task registered for the resource
pub struct JobStatusMonitor {
    api: Arc<dyn CatalogApi>,
}

impl JobStatusMonitor {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IngestionMonitor for JobStatusMonitor {
    fn name(&self) -> &'static str {
        "job-status"
    }

    async fn poll(&self, resource_id: &str) -> Result<PollStatus> {
        let Some(task) = self
            .api
            .task_status_show(resource_id, DATAPUSHER_TASK, DATAPUSHER_TASK)
            .await?
        else {
            return Ok(PollStatus::Absent);
        };

        Ok(match task.job_state() {
            JobState::Complete => PollStatus::Complete,
            state @ (JobState::Failure | JobState::Error) => PollStatus::Failed(
                task.error_message()
                    .unwrap_or_else(|| format!("ingestion job ended in state '{}'", state)),
            ),
            JobState::Pending | JobState::Running => PollStatus::InProgress,
        })
    }

    fn can_resubmit(&self) -> bool {
        true
    }

    async fn resubmit(&self, resource_id: &str) -> Result<()> {
        self.api.datapusher_submit(resource_id).await
    }
}
