//! Integration tests for logging functionality

use chrono::{Local, TimeZone};
use sqlscout::config::{LoggingSection, ScoutConfig};
use sqlscout::domain::StepId;
use sqlscout::logging::{RunLog, Severity};
use sqlscout::{log_retry_attempt, log_step_start};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingSection::default();
    assert!(!config.json_enabled);
    assert_eq!(config.json_rotation, "never");
}

#[test]
fn test_logging_rotation_types() {
    for (rotation, ok) in [("daily", true), ("hourly", true), ("never", true), ("size", false)] {
        let config: ScoutConfig = toml::from_str(&format!(
            r#"
[run]
servers = ["sql01"]
output_directory = "/tmp/sqlscout"

[source]
sql_command = ["sqlq"]
os_command = ["cimq"]

[logging]
json_rotation = "{rotation}"
"#
        ))
        .unwrap();

        assert_eq!(config.validate().is_ok(), ok, "rotation {rotation}");
    }
}

#[test]
fn test_run_log_created_in_directory() {
    let dir = TempDir::new().unwrap();
    let started = Local.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();

    let log = RunLog::create(dir.path(), started).unwrap();
    log.info("Run starting");

    assert_eq!(log.path(), dir.path().join("sqlscout_20261019_083000.log"));
    let content = std::fs::read_to_string(log.path()).unwrap();
    assert!(content.ends_with("[INFO] Run starting\n"));
}

#[test]
fn test_run_log_appends_to_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.log");

    RunLog::open(&path).unwrap().info("first run");
    RunLog::open(&path).unwrap().info("second run");

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("first run"));
    assert!(content.contains("second run"));
}

#[test]
fn test_run_log_missing_directory_is_error() {
    let dir = TempDir::new().unwrap();
    let result = RunLog::open(dir.path().join("absent").join("run.log"));
    assert!(result.is_err());
}

#[test]
fn test_min_severity_warn_drops_progress() {
    let dir = TempDir::new().unwrap();
    let log = RunLog::open(dir.path().join("run.log"))
        .unwrap()
        .with_min_severity(Severity::Warn);

    log_step_start!(log, "sql01", StepId::Databases);
    log.warn("sql01: aborted");
    log.error("Run outcome: FAILURE");

    let content = std::fs::read_to_string(log.path()).unwrap();
    assert!(!content.contains("collecting"));
    assert!(content.contains("[WARN] sql01: aborted"));
    assert!(content.contains("[ERROR] Run outcome: FAILURE"));
}

#[test]
fn test_logging_macros_usage() {
    let dir = TempDir::new().unwrap();
    let log = RunLog::open(dir.path().join("run.log")).unwrap();

    log_step_start!(log, "sql01", StepId::HostOs);
    log_retry_attempt!(log, 2, 3, "No space left on device", 1000);

    let content = std::fs::read_to_string(log.path()).unwrap();
    assert!(content.contains("[INFO] sql01 / HostOS: collecting"));
    assert!(content
        .contains("[WARN] Retrying write (attempt 2/3) in 1000ms: No space left on device"));
}
