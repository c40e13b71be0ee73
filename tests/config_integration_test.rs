//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they don't
//! interfere with each other.

use secrecy::ExposeSecret;
use sqlscout::config::{load_config, OutputMode, RunConfig, ThrottleLimit};
use sqlscout::domain::{ScoutError, SourceKind, StepId};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for var in [
        "SQLSCOUT_RUN_SERVERS",
        "SQLSCOUT_RUN_THROTTLE_LIMIT",
        "SQLSCOUT_RUN_DRY_RUN",
        "SQLSCOUT_RUN_SKIP_STEPS",
        "SQLSCOUT_EXPORT_OUTPUT_MODE",
        "SQLSCOUT_EXPORT_CHUNK_SIZE",
        "SQLSCOUT_SQL_PASSWORD",
        "TEST_SQLSCOUT_SQL_SECRET",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn minimal_config(output_dir: &str) -> String {
    format!(
        r#"
[run]
servers = ["SQL01", " sql02 ", "sql01", ""]
output_directory = "{output_dir}"

[source]
sql_command = ["sqlq", "{{server}}", "{{query}}"]
os_command = ["cimq", "{{server}}", "{{query}}"]
"#
    )
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[run]
servers = ["SQL01", "SQL02\\REPORTING"]
output_directory = "/tmp/sqlscout-out"
log_directory = "/tmp/sqlscout-logs"
throttle_limit = 8
dry_run = true
skip_steps = ["agent_jobs", "LinkedServers"]
server_timeout_seconds = 120
log_level = "debug"

[export]
chunk_size = 250
retry_backoff_ms = 100
output_mode = "replace"
delimiter = ";"

[sql]
username = "svc_inventory"
password = "plain"
query_timeout_seconds = 30

[source]
sql_command = ["sqlq", "{server}", "{query}"]
os_command = ["cimq", "{server}", "{query}"]
command_log_length = 80

[logging]
json_enabled = true
json_rotation = "daily"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.run.servers, vec!["SQL01", "SQL02\\REPORTING"]);
    assert_eq!(config.run.throttle_limit, 8);
    assert!(config.run.dry_run);
    assert_eq!(config.run.skip_steps, vec!["agent_jobs", "LinkedServers"]);
    assert_eq!(config.export.chunk_size, 250);
    assert_eq!(config.export.output_mode, OutputMode::Replace);
    assert_eq!(config.export.delimiter, ';');
    assert_eq!(config.sql.username.as_deref(), Some("svc_inventory"));
    assert_eq!(config.source.command_log_length, 80);
    assert!(config.logging.json_enabled);
}

#[test]
fn test_defaults_applied() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(&minimal_config("/tmp/sqlscout-out"));
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.run.throttle_limit, 4);
    assert!(!config.run.dry_run);
    assert_eq!(config.run.server_timeout_seconds, 900);
    assert_eq!(config.export.chunk_size, 5000);
    assert_eq!(config.export.retry_backoff_ms, 500);
    assert_eq!(config.export.output_mode, OutputMode::Append);
    assert_eq!(config.export.delimiter, ',');
    assert_eq!(config.sql.query_timeout_seconds, 60);
    assert!(config.sql.username.is_none());
}

#[test]
fn test_env_var_substitution_for_secret() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_SQLSCOUT_SQL_SECRET", "s3cret");

    let file = write_config(
        r#"
[run]
servers = ["sql01"]
output_directory = "/tmp/sqlscout-out"

[sql]
username = "svc_inventory"
password = "${TEST_SQLSCOUT_SQL_SECRET}"

[source]
sql_command = ["sqlq"]
os_command = ["cimq"]
"#,
    );

    let config = load_config(file.path()).unwrap();
    let password = config.sql.password.as_ref().unwrap();
    assert_eq!(password.expose_secret().as_ref(), "s3cret");
    assert!(!format!("{config:?}").contains("s3cret"));

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[run]
servers = ["sql01"]
output_directory = "${TEST_SQLSCOUT_SQL_SECRET}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ScoutError::Configuration(_)));
    assert!(err.to_string().contains("TEST_SQLSCOUT_SQL_SECRET"));
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SQLSCOUT_RUN_SERVERS", "a, b ,c");
    std::env::set_var("SQLSCOUT_RUN_THROTTLE_LIMIT", "16");
    std::env::set_var("SQLSCOUT_RUN_SKIP_STEPS", "Logins");
    std::env::set_var("SQLSCOUT_EXPORT_OUTPUT_MODE", "replace");

    let file = write_config(&minimal_config("/tmp/sqlscout-out"));
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.run.servers, vec!["a", "b", "c"]);
    assert_eq!(config.run.throttle_limit, 16);
    assert_eq!(config.run.skip_steps, vec!["Logins"]);
    assert_eq!(config.export.output_mode, OutputMode::Replace);

    cleanup_env_vars();
}

#[test]
fn test_invalid_throttle_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SQLSCOUT_RUN_THROTTLE_LIMIT", "3");

    let file = write_config(&minimal_config("/tmp/sqlscout-out"));
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("throttle_limit"));

    cleanup_env_vars();
}

#[test]
fn test_unknown_skip_step_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SQLSCOUT_RUN_SKIP_STEPS", "Backups");

    let file = write_config(&minimal_config("/tmp/sqlscout-out"));
    assert!(load_config(file.path()).is_err());

    cleanup_env_vars();
}

#[test]
fn test_run_config_from_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("inventory");
    let mut contents = minimal_config(&out.to_string_lossy().replace('\\', "/"));
    contents.push_str(
        r#"
[os]
username = "DOMAIN\\svc"
password = "pw"
"#,
    );
    let file = write_config(&contents);

    let config = load_config(file.path()).unwrap();
    let run = RunConfig::from_config(&config).unwrap();

    let servers: Vec<&str> = run.servers().iter().map(|s| s.as_str()).collect();
    assert_eq!(servers, vec!["SQL01", "sql02"]);
    assert_eq!(run.throttle(), ThrottleLimit::try_from(4).unwrap());
    assert!(run.output_directory().is_dir());
    assert!(run.log_directory().is_dir());
    assert!(run.log_directory().ends_with("Logs"));
    assert!(run.credential_for(SourceKind::Sql).is_none());
    assert_eq!(
        run.credential_for(SourceKind::Os).map(|c| c.username()),
        Some("DOMAIN\\svc")
    );
    assert_eq!(run.tunables().server_budget, Duration::from_secs(900));
    assert!(!run.is_skipped(StepId::HostOs));
}

#[test]
fn test_servers_sharing_output_files_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    let out = dir.path().to_string_lossy().replace('\\', "/");
    let file = write_config(&format!(
        r#"
[run]
servers = ["host\\inst", "host_inst"]
output_directory = "{out}"

[export]
output_mode = "replace"

[source]
sql_command = ["sqlq"]
os_command = ["cimq"]
"#
    ));

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ScoutError::Configuration(_)));
    assert!(err.to_string().contains("same output files"));
}
