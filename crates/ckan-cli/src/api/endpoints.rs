//! API endpoint URL builders
//!
//! Every CKAN action lives under `{base}/api/3/action/{action}`.

/// Action names used by the CLI
pub mod actions {
    pub const PACKAGE_SHOW: &str = "package_show";
    pub const RESOURCE_SHOW: &str = "resource_show";
    pub const RESOURCE_CREATE: &str = "resource_create";
    pub const RESOURCE_UPDATE: &str = "resource_update";
    pub const RESOURCE_DELETE: &str = "resource_delete";
    pub const DATASTORE_DELETE: &str = "datastore_delete";
    pub const TASK_STATUS_SHOW: &str = "task_status_show";
    pub const DATAPUSHER_SUBMIT: &str = "datapusher_submit";
}

/// Build the URL of a CKAN action
pub fn action_url(base_url: &str, action: &str) -> String {
    format!("{}/api/3/action/{}", base_url.trim_end_matches('/'), action)
}
