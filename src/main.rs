// sqlscout - SQL Server estate inventory collector
// Copyright (c) 2025 sqlscout Contributors
// Licensed under the MIT License

use clap::Parser;
use sqlscout::cli::{Cli, Commands};
use sqlscout::config::{load_config, LoggingSection};
use sqlscout::logging::init_logging;
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Diagnostic settings come from the config file when it loads; the
    // commands themselves report a broken file.
    let file_config = match &cli.command {
        Commands::Collect(_) => load_config(&cli.config).ok(),
        _ => None,
    };
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| file_config.as_ref().map(|c| c.run.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = file_config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let json_dir = file_config.as_ref().map(|c| {
        c.run
            .log_directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&c.run.output_directory).join("Logs"))
    });

    let guard = match init_logging(&log_level, &logging_config, json_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            // Fall back to console-only diagnostics at the default level.
            match init_logging("info", &LoggingSection::default(), None) {
                Ok(guard) => guard,
                Err(_) => process::exit(5),
            }
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "sqlscout - SQL Server estate inventory collector"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // process::exit skips destructors; flush the JSON appender first.
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Collect(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
