//! Configuration schema types
//!
//! This module defines the TOML configuration structure for sqlscout. The
//! types here are a faithful image of the file; [`crate::config::RunConfig`]
//! is the validated, immutable form a run actually uses.

use crate::config::SecretString;
use crate::domain::{ServerName, StepId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Throttle limits the scheduler accepts
pub const ALLOWED_THROTTLE_LIMITS: [usize; 6] = [1, 2, 4, 8, 16, 32];

/// Main sqlscout configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Run-level settings (targets, output, concurrency)
    pub run: RunSection,

    /// Export engine settings
    #[serde(default)]
    pub export: ExportSection,

    /// SQL Server authentication and query settings
    #[serde(default)]
    pub sql: SqlSection,

    /// Host OS authentication
    #[serde(default)]
    pub os: OsSection,

    /// Data source (query tool) settings
    #[serde(default)]
    pub source: SourceSection,

    /// Diagnostic logging settings
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ScoutConfig {
    /// Validates the configuration
    ///
    /// Only checks that need no filesystem access happen here; directory
    /// creation and the writability probe run when the [`RunConfig`] is built.
    ///
    /// [`RunConfig`]: crate::config::RunConfig
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.run.validate()?;
        self.export.validate()?;
        self.sql.validate()?;
        self.os.validate()?;
        self.source.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Run-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Target servers (`HOST`, `HOST\INSTANCE` or `HOST,PORT`)
    pub servers: Vec<String>,

    /// Directory receiving the delimited output files
    pub output_directory: String,

    /// Directory receiving the run log (default: `<output_directory>/Logs`)
    #[serde(default)]
    pub log_directory: Option<String>,

    /// Maximum number of servers processed concurrently
    #[serde(default = "default_throttle_limit")]
    pub throttle_limit: usize,

    /// Retrieve data but write no output files
    #[serde(default)]
    pub dry_run: bool,

    /// Collection steps to skip, by name
    #[serde(default)]
    pub skip_steps: Vec<String>,

    /// Wall-clock budget per server, checked between steps
    #[serde(default = "default_server_timeout_seconds")]
    pub server_timeout_seconds: u64,

    /// Console log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl RunSection {
    fn validate(&self) -> Result<(), String> {
        if self.servers.iter().all(|s| s.trim().is_empty()) {
            return Err("run.servers must contain at least one server".to_string());
        }

        let mut stems: HashMap<String, String> = HashMap::new();
        for server in self.servers.iter().filter_map(|s| ServerName::new(s.as_str()).ok()) {
            let key = server.as_str().to_ascii_lowercase();
            let stem = server.file_stem().to_ascii_lowercase();
            match stems.get(&stem) {
                Some(existing) if *existing != key => {
                    return Err(format!(
                        "run.servers '{existing}' and '{server}' would write to the same output files"
                    ));
                }
                Some(_) => {}
                None => {
                    stems.insert(stem, key);
                }
            }
        }

        if self.output_directory.trim().is_empty() {
            return Err("run.output_directory cannot be empty".to_string());
        }

        if let Some(dir) = &self.log_directory {
            if dir.trim().is_empty() {
                return Err("run.log_directory cannot be empty when set".to_string());
            }
        }

        if !ALLOWED_THROTTLE_LIMITS.contains(&self.throttle_limit) {
            return Err(format!(
                "Invalid run.throttle_limit {}. Must be one of: {:?}",
                self.throttle_limit, ALLOWED_THROTTLE_LIMITS
            ));
        }

        for name in &self.skip_steps {
            StepId::from_str(name)?;
        }

        if self.server_timeout_seconds == 0 {
            return Err("run.server_timeout_seconds must be > 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid run.log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        Ok(())
    }
}

/// How output files from earlier runs are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Keep appending to existing files (cumulative history)
    #[default]
    Append,
    /// Remove an existing file before the first chunk of this run
    Replace,
}

/// Export engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Maximum records written per append
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Base back-off between write attempts in milliseconds (doubles per retry)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Treatment of files left by earlier runs
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Field delimiter of the output files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Output file extension (without dot)
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

impl ExportSection {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 || self.chunk_size > 1_000_000 {
            return Err(format!(
                "export.chunk_size must be between 1 and 1000000, got {}",
                self.chunk_size
            ));
        }

        if self.retry_backoff_ms > 60_000 {
            return Err(format!(
                "export.retry_backoff_ms must be <= 60000, got {}",
                self.retry_backoff_ms
            ));
        }

        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(format!(
                "export.delimiter must be a single ASCII character other than a quote or newline, got {:?}",
                self.delimiter
            ));
        }

        if self.file_extension.is_empty()
            || !self.file_extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(format!(
                "export.file_extension must be alphanumeric, got '{}'",
                self.file_extension
            ));
        }

        Ok(())
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            retry_backoff_ms: default_retry_backoff_ms(),
            output_mode: OutputMode::default(),
            delimiter: default_delimiter(),
            file_extension: default_file_extension(),
        }
    }
}

/// SQL Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlSection {
    /// SQL login (omit for integrated authentication)
    #[serde(default)]
    pub username: Option<String>,

    /// SQL login password
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Per-query timeout handed to the data source
    #[serde(default = "default_query_timeout_seconds")]
    pub query_timeout_seconds: u64,
}

impl SqlSection {
    fn validate(&self) -> Result<(), String> {
        validate_credential_pair("sql", &self.username, &self.password)?;
        if self.query_timeout_seconds == 0 {
            return Err("sql.query_timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for SqlSection {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            query_timeout_seconds: default_query_timeout_seconds(),
        }
    }
}

/// Host OS configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OsSection {
    /// OS account (omit to use the caller's identity)
    #[serde(default)]
    pub username: Option<String>,

    /// OS account password
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,
}

impl OsSection {
    fn validate(&self) -> Result<(), String> {
        validate_credential_pair("os", &self.username, &self.password)
    }
}

/// Data source configuration
///
/// Each command is an argument vector; the placeholders `{server}`,
/// `{query}`, `{step}` and `{timeout}` are substituted per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Command used for SQL Server steps
    #[serde(default)]
    pub sql_command: Vec<String>,

    /// Command used for host OS steps
    #[serde(default)]
    pub os_command: Vec<String>,

    /// Maximum characters of a rendered command written to the log
    #[serde(default = "default_command_log_length")]
    pub command_log_length: usize,
}

impl SourceSection {
    fn validate(&self) -> Result<(), String> {
        if self.sql_command.first().map(|p| p.trim().is_empty()).unwrap_or(true) {
            return Err("source.sql_command must name a program".to_string());
        }
        if self.os_command.first().map(|p| p.trim().is_empty()).unwrap_or(true) {
            return Err("source.os_command must name a program".to_string());
        }
        if self.command_log_length == 0 {
            return Err("source.command_log_length must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            sql_command: Vec::new(),
            os_command: Vec::new(),
            command_log_length: default_command_log_length(),
        }
    }
}

/// Diagnostic logging configuration
///
/// The run log itself is always written; this section controls the
/// additional JSON diagnostics file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Write JSON-formatted diagnostics next to the run log
    #[serde(default)]
    pub json_enabled: bool,

    /// Rotation of the JSON diagnostics file
    #[serde(default = "default_rotation")]
    pub json_rotation: String,
}

impl LoggingSection {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.json_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.json_rotation '{}'. Must be one of: {}",
                self.json_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            json_enabled: false,
            json_rotation: default_rotation(),
        }
    }
}

fn validate_credential_pair(
    section: &str,
    username: &Option<String>,
    password: &Option<SecretString>,
) -> Result<(), String> {
    use secrecy::ExposeSecret;

    match (username, password) {
        (Some(user), _) if user.trim().is_empty() => {
            Err(format!("{section}.username cannot be empty when set"))
        }
        (Some(_), None) => Err(format!(
            "{section}.password is required when {section}.username is set"
        )),
        (None, Some(_)) => Err(format!(
            "{section}.username is required when {section}.password is set"
        )),
        (Some(_), Some(pw)) if pw.expose_secret().is_empty() => {
            Err(format!("{section}.password cannot be empty"))
        }
        _ => Ok(()),
    }
}

// Default value functions
fn default_throttle_limit() -> usize {
    4
}

fn default_server_timeout_seconds() -> u64 {
    900
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chunk_size() -> usize {
    5000
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_delimiter() -> char {
    ','
}

fn default_file_extension() -> String {
    "csv".to_string()
}

fn default_query_timeout_seconds() -> u64 {
    60
}

fn default_command_log_length() -> usize {
    256
}

fn default_rotation() -> String {
    "never".to_string()
}
