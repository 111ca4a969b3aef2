//! CKAN Resource CLI Library
//!
//! Command-line client that keeps a file-backed resource of a CKAN dataset up to
//! date and waits for the server to load it into the DataStore.
//!
//! # Overview
//!
//! - **Upload**: create the resource if its name is new in the dataset, otherwise
//!   update its file, then wait for ingestion (`ckan-resource upload`)
//! - **Delete**: remove a resource by name (`ckan-resource delete`)
//!
//! Ingestion is tracked by a pluggable [`ingest::IngestionMonitor`]; the
//! [`ingest::IngestionWaiter`] state machine applies the timeout and the
//! resubmission budget.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod resource;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use config::DEFAULT_API_TIMEOUT_SECS;
use ingest::waiter::{DEFAULT_MAX_RESUBMISSIONS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_WAIT_TIMEOUT_SECS};
use ingest::{MonitorKind, WaitConfig};
use resource::DEFAULT_DESCRIPTION;
use std::path::PathBuf;
use std::time::Duration;

/// Create, update, or delete CKAN resources
#[derive(Parser, Debug)]
#[command(name = "ckan-resource")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the CKAN instance (e.g., https://data.bodik.jp)
    #[arg(long, env = "CKAN_URL", required_unless_present = "markdown_help")]
    pub ckan_url: Option<String>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "CKAN_API_TIMEOUT_SECS", value_name = "SECS", default_value_t = DEFAULT_API_TIMEOUT_SECS)]
    pub api_timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the command reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

impl Cli {
    /// Validated connection settings
    pub fn config(&self) -> Result<Config> {
        let url = self
            .ckan_url
            .as_deref()
            .ok_or_else(|| CliError::config("--ckan-url is required"))?;

        Ok(Config::new(url)?.with_api_timeout(Duration::from_secs(self.api_timeout)))
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update a resource, then wait for DataStore ingestion
    Upload {
        /// CKAN API key
        api_key: String,

        /// ID or name of the target package
        package_id: String,

        /// Name of the resource to create or update
        resource_name: String,

        /// Path to the data file (e.g., CSV)
        file_path: PathBuf,

        /// Resource description (used when creating)
        #[arg(long, default_value = DEFAULT_DESCRIPTION)]
        description: String,

        /// Do not reset an inactive DataStore table before updating
        #[arg(long)]
        skip_datastore_reset: bool,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete a resource by name
    Delete {
        /// CKAN API key
        api_key: String,

        /// ID or name of the target package
        package_id: String,

        /// Name of the resource to delete
        resource_name: String,
    },
}

/// Ingestion wait options
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// How to watch the ingestion job
    #[arg(long, value_enum, env = "CKAN_INGEST_MONITOR", default_value_t = MonitorKind::ResourceStatus)]
    pub monitor: MonitorKind,

    /// Seconds to wait for one ingestion attempt
    #[arg(long, env = "CKAN_WAIT_TIMEOUT_SECS", value_name = "SECS", default_value_t = DEFAULT_WAIT_TIMEOUT_SECS)]
    pub wait_timeout: u64,

    /// Seconds between status checks (at least 1)
    #[arg(
        long,
        env = "CKAN_POLL_INTERVAL_SECS",
        value_name = "SECS",
        default_value_t = DEFAULT_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval: u64,

    /// Times a stuck job is resubmitted (job-status monitor only)
    #[arg(long, env = "CKAN_MAX_RESUBMISSIONS", default_value_t = DEFAULT_MAX_RESUBMISSIONS)]
    pub max_resubmissions: u32,

    /// Wait one poll interval before the first check
    ///
    /// Always done after updating a resource whose DataStore was already
    /// active, since its record keeps reporting the previous load until the
    /// new ingestion job starts.
    #[arg(long)]
    pub initial_delay: bool,
}

impl WaitArgs {
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::default()
            .with_timeout(Duration::from_secs(self.wait_timeout))
            .with_poll_interval(Duration::from_secs(self.poll_interval))
            .with_max_resubmissions(self.max_resubmissions)
            .with_initial_delay(self.initial_delay)
    }
}
