//! Collect command implementation
//!
//! This module implements the `collect` command, which runs every collection
//! step against every configured server.

use crate::adapters::CommandSource;
use crate::config::loader::split_list;
use crate::config::{load_config, RunConfig, ScoutConfig};
use crate::core::{CollectionCoordinator, RunSummary};
use crate::logging::{RunLog, Severity};
use chrono::Local;
use clap::Args;
use std::str::FromStr;
use std::sync::Arc;

/// Failure entries printed before the list is cut short
const MAX_PRINTED_ENTRIES: usize = 20;

/// Arguments for the collect command
#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// Override target servers (comma-separated)
    #[arg(long)]
    pub servers: Option<String>,

    /// Override the number of servers processed concurrently (1, 2, 4, 8, 16 or 32)
    #[arg(long)]
    pub throttle: Option<usize>,

    /// Override steps to skip (comma-separated step names)
    #[arg(long)]
    pub skip: Option<String>,

    /// Dry run mode - query servers but write no output files
    #[arg(long)]
    pub dry_run: bool,

    /// Override the output directory
    #[arg(long)]
    pub output_dir: Option<String>,
}

impl CollectArgs {
    /// Execute the collect command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Starting collect command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        let run_config = match RunConfig::from_config(&config) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Configuration validation failed");
                eprintln!("Configuration validation failed: {e}");
                return Ok(2);
            }
        };

        let min_severity = Severity::from_str(&config.run.log_level).unwrap_or(Severity::Info);
        let log = match RunLog::create(run_config.log_directory(), Local::now()) {
            Ok(log) => Arc::new(log.with_min_severity(min_severity)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create run log");
                eprintln!("Failed to create run log: {e}");
                return Ok(5);
            }
        };

        if run_config.dry_run() {
            println!("DRY RUN MODE - servers are queried but no output files are written");
            println!();
        }

        println!(
            "Collecting from {} server(s), throttle {}",
            run_config.servers().len(),
            run_config.throttle()
        );
        println!("  Output: {}", run_config.output_directory().display());
        println!("  Log: {}", log.path().display());
        println!();

        let source = Arc::new(CommandSource::new(&config.source, Arc::clone(&log)));
        let coordinator = CollectionCoordinator::new(run_config, source, log);
        let summary = coordinator.execute().await;

        print_summary(&summary);

        Ok(summary.exit_code())
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut ScoutConfig) {
        if let Some(servers) = &self.servers {
            let servers = split_list(servers);
            tracing::info!(count = servers.len(), "Overriding servers from CLI");
            config.run.servers = servers;
        }

        if let Some(throttle) = self.throttle {
            tracing::info!(throttle, "Overriding throttle limit from CLI");
            config.run.throttle_limit = throttle;
        }

        if let Some(skip) = &self.skip {
            let steps = split_list(skip);
            tracing::info!(steps = ?steps, "Overriding skipped steps from CLI");
            config.run.skip_steps = steps;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.run.dry_run = true;
        }

        if let Some(dir) = &self.output_dir {
            tracing::info!(output_directory = %dir, "Overriding output directory from CLI");
            config.run.output_directory = dir.clone();
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Collection Summary:");
    println!("  Run ID: {}", summary.run_id);
    println!("  Servers: {}", summary.total_servers);
    println!("  Successful: {}", summary.successful_servers);
    println!("  Failed: {}", summary.failed_servers);
    println!("  Failure entries: {}", summary.failure_entries);
    if summary.dry_run {
        println!("  Dry-run notices: {}", summary.notices);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    let failures: Vec<_> = summary.failures().collect();
    if !failures.is_empty() {
        println!("Failures:");
        for entry in failures.iter().take(MAX_PRINTED_ENTRIES) {
            println!("  - {entry}");
        }
        if failures.len() > MAX_PRINTED_ENTRIES {
            println!(
                "  ... and {} more (see the run log)",
                failures.len() - MAX_PRINTED_ENTRIES
            );
        }
        println!();
    }

    if summary.is_successful() {
        println!("Collection completed successfully");
    } else {
        println!("Collection completed with failures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ScoutConfig {
        toml::from_str(
            r#"
            [run]
            servers = ["sql01"]
            output_directory = "/tmp/out"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_collect_args_defaults() {
        let args = CollectArgs::default();
        let mut config = base_config();
        args.apply_overrides(&mut config);

        assert_eq!(config.run.servers, vec!["sql01".to_string()]);
        assert_eq!(config.run.throttle_limit, 4);
        assert!(!config.run.dry_run);
    }

    #[test]
    fn test_collect_args_with_overrides() {
        let args = CollectArgs {
            servers: Some("sql02, sql03 ,".to_string()),
            throttle: Some(8),
            skip: Some("AgentJobs,linked_servers".to_string()),
            dry_run: true,
            output_dir: Some("/data/inventory".to_string()),
        };
        let mut config = base_config();
        args.apply_overrides(&mut config);

        assert_eq!(config.run.servers, vec!["sql02", "sql03"]);
        assert_eq!(config.run.throttle_limit, 8);
        assert_eq!(config.run.skip_steps, vec!["AgentJobs", "linked_servers"]);
        assert!(config.run.dry_run);
        assert_eq!(config.run.output_directory, "/data/inventory");
    }
}
