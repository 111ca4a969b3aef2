//! Resource lookup by name

use crate::api::CatalogApi;
use crate::error::Result;
use ckan_common::types::Resource;
use tracing::debug;

/// Return the first resource of `package_id` whose name is exactly `name`
///
/// Any transport or decode error is returned as-is; there is no partial result.
pub async fn find_resource_by_name(
    api: &dyn CatalogApi,
    package_id: &str,
    name: &str,
) -> Result<Option<Resource>> {
    let package = api.package_show(package_id).await?;
    let found = package.find_resource(name).cloned();

    debug!(
        package_id,
        name,
        resources = package.resources.len(),
        found = found.is_some(),
        "Resource lookup"
    );

    Ok(found)
}
