//! Resource lookup and mutation
//!
//! - [`locator`]: find a resource by name inside a dataset
//! - [`mutator`]: create-or-update with ingestion wait, and delete by name

pub mod locator;
pub mod mutator;

pub use locator::find_resource_by_name;
pub use mutator::{
    delete_by_name, DeleteOutcome, ResetOutcome, ResourceMutator, UploadAction, UploadReport,
    UploadRequest, DEFAULT_DESCRIPTION,
};
