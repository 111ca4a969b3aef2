//! CKAN Resource CLI - Main entry point

use ckan_cli::resource::UploadRequest;
use ckan_cli::{Cli, Commands};
use ckan_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Pick up CKAN_* variables from a local .env file, if any
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    // Console gets warnings only, unless verbose
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("ckan-resource")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // CLI should work without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        if let Some(body) = e.server_body() {
            eprintln!("Server response: {}", body);
        }
        process::exit(1);
    }

    println!("Script finished.");
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> ckan_cli::Result<()> {
    // Checked in main
    let Some(ref command) = cli.command else {
        unreachable!("Command should have been validated in main");
    };

    let config = cli.config()?;

    match command {
        Commands::Upload {
            api_key,
            package_id,
            resource_name,
            file_path,
            description,
            skip_datastore_reset,
            wait,
        } => {
            let request = UploadRequest::new(package_id, resource_name, file_path)
                .with_description(description)
                .with_datastore_reset(!skip_datastore_reset);

            ckan_cli::commands::upload::run(
                config,
                api_key.clone(),
                request,
                wait.monitor,
                wait.wait_config(),
            )
            .await
        }

        Commands::Delete {
            api_key,
            package_id,
            resource_name,
        } => {
            ckan_cli::commands::delete::run(
                config,
                api_key.clone(),
                package_id.clone(),
                resource_name.clone(),
            )
            .await
        }
    }
}
