//! In-memory catalog used by unit tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::api::{CatalogApi, NewResource, UploadFile};
use crate::error::{CliError, Result};
use async_trait::async_trait;
use ckan_common::types::{Package, Resource, TaskStatus};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a task status record
pub fn task(state: &str, error: Option<&str>) -> TaskStatus {
    TaskStatus {
        entity_id: None,
        task_type: Some("datapusher".to_string()),
        key: Some("datapusher".to_string()),
        state: state.to_string(),
        error: error.map(|e| serde_json::Value::String(e.to_string())),
        last_updated: None,
    }
}

#[derive(Default)]
struct State {
    resources: Vec<Resource>,
    uploads: Vec<(String, UploadFile)>,
    tasks: VecDeque<Option<TaskStatus>>,
    calls: Vec<&'static str>,
    next_id: u32,
    fail_package_show: bool,
    fail_datastore_delete: bool,
    datastore_missing: bool,
}

/// Fake catalog holding a single dataset
///
/// Newly created or updated resources are reported as ingested unless
/// [`FakeCatalog::ingest_on_upload`] is turned off.
pub struct FakeCatalog {
    package_id: String,
    ingest_on_upload: Mutex<bool>,
    state: Mutex<State>,
}

impl FakeCatalog {
    pub fn new(package_id: &str) -> Self {
        Self {
            package_id: package_id.to_string(),
            ingest_on_upload: Mutex::new(true),
            state: Mutex::new(State::default()),
        }
    }

    pub fn ingest_on_upload(&self, ingest: bool) {
        *self.ingest_on_upload.lock().unwrap() = ingest;
    }

    /// Add a resource and return its ID
    pub fn add_resource(&self, name: &str, datastore_active: bool) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("res-{}", state.next_id);
        state.resources.push(Resource {
            id: id.clone(),
            name: Some(name.to_string()),
            package_id: Some(self.package_id.clone()),
            description: None,
            format: Some("CSV".to_string()),
            datastore_active: Some(datastore_active),
            state: Some("active".to_string()),
        });
        id
    }

    pub fn set_resource_state(&self, id: &str, state_flag: Option<&str>, datastore_active: bool) {
        let mut state = self.state.lock().unwrap();
        let resource = state.resources.iter_mut().find(|r| r.id == id).unwrap();
        resource.state = state_flag.map(str::to_string);
        resource.datastore_active = Some(datastore_active);
    }

    pub fn push_task(&self, task: Option<TaskStatus>) {
        self.state.lock().unwrap().tasks.push_back(task);
    }

    pub fn fail_package_show(&self) {
        self.state.lock().unwrap().fail_package_show = true;
    }

    pub fn fail_datastore_delete(&self) {
        self.state.lock().unwrap().fail_datastore_delete = true;
    }

    pub fn datastore_missing(&self) {
        self.state.lock().unwrap().datastore_missing = true;
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.state.lock().unwrap().resources.clone()
    }

    /// (resource ID, file) pairs in upload order
    pub fn uploads(&self) -> Vec<(String, UploadFile)> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| **c == action).count()
    }

    fn record(&self, action: &'static str) {
        self.state.lock().unwrap().calls.push(action);
    }

    fn not_found(action: &str, id: &str) -> CliError {
        CliError::server(action, 404, format!(r#"{{"success": false, "error": {{"message": "{} not found"}}}}"#, id))
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn package_show(&self, package_id: &str) -> Result<Package> {
        self.record("package_show");
        let state = self.state.lock().unwrap();
        if state.fail_package_show {
            return Err(CliError::server("package_show", 500, "Internal Server Error"));
        }
        if package_id != self.package_id {
            return Err(Self::not_found("package_show", package_id));
        }
        Ok(Package {
            id: self.package_id.clone(),
            name: None,
            resources: state.resources.clone(),
        })
    }

    async fn resource_show(&self, resource_id: &str) -> Result<Resource> {
        self.record("resource_show");
        let state = self.state.lock().unwrap();
        state
            .resources
            .iter()
            .find(|r| r.id == resource_id)
            .cloned()
            .ok_or_else(|| Self::not_found("resource_show", resource_id))
    }

    async fn resource_create(&self, resource: &NewResource, file: &UploadFile) -> Result<Resource> {
        self.record("resource_create");
        let ingest = *self.ingest_on_upload.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = Resource {
            id: format!("res-{}", state.next_id),
            name: Some(resource.name.clone()),
            package_id: Some(resource.package_id.clone()),
            description: Some(resource.description.clone()),
            format: Some(resource.format.clone()),
            datastore_active: Some(ingest),
            state: Some("active".to_string()),
        };
        state.resources.push(created.clone());
        state.uploads.push((created.id.clone(), file.clone()));
        Ok(created)
    }

    async fn resource_update(&self, resource_id: &str, file: &UploadFile) -> Result<Resource> {
        self.record("resource_update");
        let ingest = *self.ingest_on_upload.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        let resource = state
            .resources
            .iter_mut()
            .find(|r| r.id == resource_id)
            .ok_or_else(|| Self::not_found("resource_update", resource_id))?;
        resource.datastore_active = Some(ingest);
        let updated = resource.clone();
        state.uploads.push((resource_id.to_string(), file.clone()));
        Ok(updated)
    }

    async fn resource_delete(&self, resource_id: &str) -> Result<()> {
        self.record("resource_delete");
        let mut state = self.state.lock().unwrap();
        let before = state.resources.len();
        state.resources.retain(|r| r.id != resource_id);
        if state.resources.len() == before {
            return Err(Self::not_found("resource_delete", resource_id));
        }
        Ok(())
    }

    async fn datastore_delete(&self, _resource_id: &str, _force: bool) -> Result<bool> {
        self.record("datastore_delete");
        let state = self.state.lock().unwrap();
        if state.fail_datastore_delete {
            return Err(CliError::server("datastore_delete", 409, "table is locked"));
        }
        Ok(!state.datastore_missing)
    }

    async fn task_status_show(
        &self,
        _entity_id: &str,
        _task_type: &str,
        _key: &str,
    ) -> Result<Option<TaskStatus>> {
        self.record("task_status_show");
        Ok(self.state.lock().unwrap().tasks.pop_front().flatten())
    }

    async fn datapusher_submit(&self, _resource_id: &str) -> Result<()> {
        self.record("datapusher_submit");
        Ok(())
    }
}
