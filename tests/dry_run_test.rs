//! Integration tests for dry-run mode
//!
//! These tests verify that `--dry-run` retrieves every step but writes no
//! output files, and that the run still reports real failures.

use async_trait::async_trait;
use serde_json::json;
use sqlscout::adapters::{DataSource, FetchRequest};
use sqlscout::cli::commands::collect::CollectArgs;
use sqlscout::config::{RunConfig, ScoutConfig};
use sqlscout::core::export::ExportSettings;
use sqlscout::core::registry;
use sqlscout::core::{CollectionCoordinator, EntryKind};
use sqlscout::domain::{CollectionResult, SourceError, StepId};
use sqlscout::logging::RunLog;
use std::sync::Arc;
use tempfile::TempDir;

/// Returns one record per call, optionally failing one step
struct OneRowSource {
    fail_step: Option<StepId>,
}

#[async_trait]
impl DataSource for OneRowSource {
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<CollectionResult, SourceError> {
        if Some(request.step.id) == self.fail_step {
            return Err(SourceError::ConnectionFailed {
                server: request.server.to_string(),
                message: "login failed".to_string(),
            });
        }
        let record = match json!({"server": request.server.as_str()}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        Ok(CollectionResult::new(vec![record]))
    }
}

fn base_config(output_dir: &str) -> ScoutConfig {
    toml::from_str(&format!(
        r#"
[run]
servers = ["sql01", "sql02"]
output_directory = "{output_dir}"
throttle_limit = 2

[source]
sql_command = ["sqlq"]
os_command = ["cimq"]
"#
    ))
    .unwrap()
}

fn csv_files(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".csv"))
        .collect()
}

#[test]
fn test_cli_flag_enables_dry_run() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(&dir.path().to_string_lossy());
    assert!(!config.run.dry_run);

    let args = CollectArgs {
        dry_run: true,
        ..CollectArgs::default()
    };
    args.apply_overrides(&mut config);

    let run = RunConfig::from_config(&config).unwrap();
    assert!(run.dry_run());
    assert!(ExportSettings::from_run_config(&run).dry_run);
}

#[test]
fn test_dry_run_off_by_default() {
    let dir = TempDir::new().unwrap();
    let config = base_config(&dir.path().to_string_lossy());

    let run = RunConfig::from_config(&config).unwrap();
    assert!(!ExportSettings::from_run_config(&run).dry_run);
}

#[tokio::test]
async fn test_dry_run_writes_no_files_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let run = RunConfig::builder(["sql01", "sql02"], dir.path())
        .throttle(2)
        .dry_run(true)
        .skip([StepId::AgentJobs])
        .build()
        .unwrap();
    let log = Arc::new(RunLog::open(run.log_directory().join("run.log")).unwrap());
    let source = Arc::new(OneRowSource { fail_step: None });

    let summary = CollectionCoordinator::new(run, source, Arc::clone(&log))
        .execute()
        .await;

    assert!(summary.dry_run);
    assert_eq!(summary.successful_servers, 2);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.failure_entries, 0);
    assert_eq!(summary.notices, 2 * (registry::steps().len() - 1));
    assert!(summary
        .entries
        .iter()
        .all(|e| e.kind == EntryKind::DryRun && e.step != Some(StepId::AgentJobs)));
    assert!(csv_files(dir.path()).is_empty());

    let content = std::fs::read_to_string(log.path()).unwrap();
    assert!(content.contains("[DRY-RUN] sql01 / SqlInstanceInfo: would export 1 records"));
}

#[tokio::test]
async fn test_dry_run_still_reports_step_failures() {
    let dir = TempDir::new().unwrap();
    let run = RunConfig::builder(["sql01"], dir.path())
        .dry_run(true)
        .build()
        .unwrap();
    let log = Arc::new(RunLog::open(run.log_directory().join("run.log")).unwrap());
    let source = Arc::new(OneRowSource {
        fail_step: Some(StepId::Databases),
    });

    let summary = CollectionCoordinator::new(run, source, log).execute().await;

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.failed_servers, 1);
    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, EntryKind::StepFailed);
    // Steps before the failure were still retrieved.
    assert_eq!(summary.notices, 4);
    assert!(csv_files(dir.path()).is_empty());
}
