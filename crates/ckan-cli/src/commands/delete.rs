//! `ckan-resource delete` command implementation

use crate::api::CkanClient;
use crate::config::Config;
use crate::error::Result;
use crate::resource::{delete_by_name, DeleteOutcome};
use colored::Colorize;

/// Delete a resource by name; succeeds without doing anything if it does not exist
pub async fn run(
    config: Config,
    api_key: String,
    package_id: String,
    resource_name: String,
) -> Result<()> {
    let client = CkanClient::new(&config, api_key)?;

    println!(
        "{} Searching for resource '{}' in package '{}' to delete...",
        "→".cyan(),
        resource_name,
        package_id
    );

    match delete_by_name(&client, &package_id, &resource_name).await? {
        DeleteOutcome::Deleted { resource_id } => println!(
            "{} Resource '{}' (ID: {}) deleted successfully.",
            "✓".green(),
            resource_name,
            resource_id
        ),
        DeleteOutcome::NotFound => println!(
            "Resource '{}' not found in package '{}'. Nothing to delete.",
            resource_name, package_id
        ),
    }

    Ok(())
}
