//! Validate config command implementation
//!
//! This module implements the `validate-config` command. Validation is pure:
//! no directories are created and no server is contacted.

use crate::config::{load_config, ScoutConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
                println!();
                print_config_summary(&config);
                Ok(0)
            }
            Err(e) => {
                println!("Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2)
            }
        }
    }
}

fn print_config_summary(config: &ScoutConfig) {
    let servers: Vec<&str> = config
        .run
        .servers
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    println!("Configuration Summary:");
    println!("  Servers ({}): {}", servers.len(), servers.join(", "));
    println!("  Throttle Limit: {}", config.run.throttle_limit);
    println!(
        "  Skipped Steps: {}",
        if config.run.skip_steps.is_empty() {
            "none".to_string()
        } else {
            config.run.skip_steps.join(", ")
        }
    );
    println!("  Output Directory: {}", config.run.output_directory);
    println!(
        "  Log Directory: {}",
        config
            .run
            .log_directory
            .clone()
            .unwrap_or_else(|| format!("{}/Logs", config.run.output_directory))
    );
    println!("  Dry Run: {}", config.run.dry_run);
    println!("  Server Budget: {}s", config.run.server_timeout_seconds);
    println!("  Query Timeout: {}s", config.sql.query_timeout_seconds);
    println!("  Chunk Size: {}", config.export.chunk_size);
    println!("  Output Mode: {:?}", config.export.output_mode);
    println!(
        "  SQL Authentication: {}",
        config.sql.username.as_deref().unwrap_or("integrated")
    );
    println!(
        "  OS Authentication: {}",
        config.os.username.as_deref().unwrap_or("integrated")
    );
    println!();
}
