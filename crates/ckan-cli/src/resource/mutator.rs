//! Create-or-update of file-backed resources
//!
//! The resource name is the identity: uploading twice under the same name
//! updates the existing resource instead of creating a duplicate.

use crate::api::{CatalogApi, NewResource, UploadFile};
use crate::error::Result;
use crate::ingest::{wait_for_ingestion, IngestionMonitor, WaitConfig, WaitReport};
use crate::resource::locator::find_resource_by_name;
use std::path::PathBuf;
use tracing::{info, warn};

/// Description used when none is given on the command line
pub const DEFAULT_DESCRIPTION: &str = "Data uploaded via script";

/// What to upload and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub package_id: String,
    pub resource_name: String,
    pub file_path: PathBuf,
    pub description: String,
    /// Drop the DataStore table of an existing, inactive resource before updating
    pub reset_inactive_datastore: bool,
}

impl UploadRequest {
    pub fn new(
        package_id: impl Into<String>,
        resource_name: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            resource_name: resource_name.into(),
            file_path: file_path.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            reset_inactive_datastore: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_datastore_reset(mut self, reset: bool) -> Self {
        self.reset_inactive_datastore = reset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    Created,
    Updated,
}

/// Result of the pre-update DataStore reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    /// No table existed
    NotPresent,
    /// Reset failed; the update went ahead anyway
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub resource_id: String,
    pub action: UploadAction,
    pub bytes: u64,
    pub datastore_reset: Option<ResetOutcome>,
    /// `None` when the server did not return a resource ID to wait on
    pub wait: Option<WaitReport>,
}

/// Uploads files and waits for their ingestion
pub struct ResourceMutator<'a> {
    api: &'a dyn CatalogApi,
    monitor: &'a dyn IngestionMonitor,
    wait: WaitConfig,
}

impl<'a> ResourceMutator<'a> {
    pub fn new(api: &'a dyn CatalogApi, monitor: &'a dyn IngestionMonitor, wait: WaitConfig) -> Self {
        Self { api, monitor, wait }
    }

    /// Ensure a resource named `request.resource_name` holds the file's content
    ///
    /// The file is read before any network call. An unsuccessful wait is reported
    /// in [`UploadReport::wait`]; the upload itself is not rolled back.
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadReport> {
        let file = UploadFile::open(&request.file_path).await?;

        info!(
            resource = %request.resource_name,
            package = %request.package_id,
            "Searching for resource"
        );
        let existing =
            find_resource_by_name(self.api, &request.package_id, &request.resource_name).await?;

        let (resource_id, action, datastore_reset, was_active) = match existing {
            Some(resource) => {
                info!(resource_id = %resource.id, "Found existing resource");
                let was_active = resource.is_datastore_active();

                let reset = if request.reset_inactive_datastore && !was_active {
                    Some(self.reset_datastore(&resource.id).await)
                } else {
                    None
                };

                info!(resource_id = %resource.id, bytes = file.size, "Updating resource");
                self.api.resource_update(&resource.id, &file).await?;
                (resource.id, UploadAction::Updated, reset, was_active)
            },
            None => {
                info!(resource = %request.resource_name, bytes = file.size, "Resource not found, creating a new one");
                let new_resource = NewResource::new(
                    request.package_id.as_str(),
                    request.resource_name.as_str(),
                    request.description.as_str(),
                );
                let created = self.api.resource_create(&new_resource, &file).await?;
                info!(resource_id = %created.id, "Resource created");
                (created.id, UploadAction::Created, None, false)
            },
        };

        // The record keeps reporting the previous load until the new job starts
        let wait_config = if was_active {
            self.wait.with_initial_delay(true)
        } else {
            self.wait
        };

        let wait = if resource_id.is_empty() {
            warn!("Server returned no resource ID, skipping ingestion wait");
            None
        } else {
            Some(wait_for_ingestion(self.monitor, &resource_id, &wait_config).await)
        };

        Ok(UploadReport {
            resource_id,
            action,
            bytes: file.size,
            datastore_reset,
            wait,
        })
    }

    /// Clear a stuck DataStore table; failures are logged and swallowed
    async fn reset_datastore(&self, resource_id: &str) -> ResetOutcome {
        warn!(resource_id, "Resource DataStore is not active, attempting to reset it");

        match self.api.datastore_delete(resource_id, true).await {
            Ok(true) => {
                info!(resource_id, "DataStore table has been reset");
                ResetOutcome::Reset
            },
            Ok(false) => {
                info!(resource_id, "DataStore table did not exist");
                ResetOutcome::NotPresent
            },
            Err(e) => {
                warn!(
                    resource_id,
                    error = %e,
                    server_response = e.server_body().unwrap_or(""),
                    "Error resetting DataStore, proceeding with update anyway"
                );
                ResetOutcome::Failed(e.to_string())
            },
        }
    }
}

/// Result of a delete-by-name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { resource_id: String },
    NotFound,
}

/// Delete the first resource named `name` in `package_id`, if there is one
pub async fn delete_by_name(
    api: &dyn CatalogApi,
    package_id: &str,
    name: &str,
) -> Result<DeleteOutcome> {
    info!(resource = name, package = package_id, "Searching for resource to delete");

    let Some(resource) = find_resource_by_name(api, package_id, name).await? else {
        return Ok(DeleteOutcome::NotFound);
    };

    info!(resource_id = %resource.id, "Deleting resource");
    api.resource_delete(&resource.id).await?;

    Ok(DeleteOutcome::Deleted {
        resource_id: resource.id,
    })
}
