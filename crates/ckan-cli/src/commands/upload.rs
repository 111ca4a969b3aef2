//! `ckan-resource upload` command implementation
//!
//! Creates or updates a resource and waits for DataStore ingestion. A failed or
//! timed-out ingestion is reported as a warning; only errors before or during
//! the upload itself fail the command.

use crate::api::{CatalogApi, CkanClient};
use crate::config::Config;
use crate::error::Result;
use crate::format::{format_bytes, format_duration};
use crate::ingest::{MonitorKind, WaitConfig, WaitOutcome};
use crate::resource::{ResetOutcome, ResourceMutator, UploadAction, UploadRequest};
use colored::Colorize;
use std::sync::Arc;

/// Upload a file to a named resource
pub async fn run(
    config: Config,
    api_key: String,
    request: UploadRequest,
    monitor: MonitorKind,
    wait: WaitConfig,
) -> Result<()> {
    let client: Arc<dyn CatalogApi> = Arc::new(CkanClient::new(&config, api_key)?);
    let monitor = monitor.build(client.clone());

    println!(
        "{} Uploading {} to resource '{}' in package '{}'...",
        "→".cyan(),
        request.file_path.display(),
        request.resource_name,
        request.package_id
    );

    let report = ResourceMutator::new(client.as_ref(), monitor.as_ref(), wait)
        .upload(&request)
        .await?;

    if let Some(ResetOutcome::Failed(reason)) = &report.datastore_reset {
        println!(
            "{} Could not reset the DataStore table ({}); updated anyway",
            "!".yellow(),
            reason
        );
    }

    match report.action {
        UploadAction::Created => println!(
            "{} New resource created successfully with ID: {} ({})",
            "✓".green(),
            report.resource_id,
            format_bytes(report.bytes)
        ),
        UploadAction::Updated => println!(
            "{} Resource {} updated successfully ({})",
            "✓".green(),
            report.resource_id,
            format_bytes(report.bytes)
        ),
    }

    let Some(wait_report) = report.wait else {
        return Ok(());
    };

    match &wait_report.outcome {
        WaitOutcome::Succeeded => println!(
            "{} DataStore is now active (after {})",
            "✓".green(),
            format_duration(wait_report.elapsed)
        ),
        WaitOutcome::JobFailed(reason) => println!(
            "{} DataStore import failed: {}. Please check the resource on CKAN.",
            "✗".red(),
            reason
        ),
        WaitOutcome::TimedOut => println!(
            "{} Timeout reached. DataStore not active after {} ({} resubmission(s)).",
            "✗".red(),
            format_duration(wait_report.elapsed),
            wait_report.resubmissions
        ),
        WaitOutcome::ResubmitFailed(reason) => println!(
            "{} Gave up waiting: could not resubmit the ingestion job: {}",
            "✗".red(),
            reason
        ),
    }

    Ok(())
}
