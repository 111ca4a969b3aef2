//! API request types
//!
//! Response records live in `ckan_common::types`; this module holds what the CLI sends.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format tag attached to newly created resources
pub const DEFAULT_RESOURCE_FORMAT: &str = "CSV";

/// Fields of a resource to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResource {
    pub package_id: String,
    pub name: String,
    pub description: String,
    pub format: String,
}

impl NewResource {
    pub fn new(
        package_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            name: name.into(),
            description: description.into(),
            format: DEFAULT_RESOURCE_FORMAT.to_string(),
        }
    }
}

/// Local file sent as the `upload` part of a multipart request
///
/// Holds metadata only; the content is streamed from disk when the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

impl UploadFile {
    /// Check that `path` is a readable regular file and record its size
    ///
    /// A path that does not exist is `FileNotFound`; any other failure to
    /// inspect or open it is reported as an I/O error.
    pub async fn open(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }

        let file = tokio::fs::File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            )
            .into());
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
        })
    }
}

/// Body of `resource_delete`
#[derive(Debug, Clone, Serialize)]
pub struct IdRequest<'a> {
    pub id: &'a str,
}

/// Body of `datastore_delete`
#[derive(Debug, Clone, Serialize)]
pub struct DatastoreDeleteRequest<'a> {
    pub resource_id: &'a str,
    pub force: bool,
}

/// Body of `datapusher_submit`
#[derive(Debug, Clone, Serialize)]
pub struct DatapusherSubmitRequest<'a> {
    pub resource_id: &'a str,
}
