//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{OutputMode, ScoutConfig};
use super::secret::secret_string;
use crate::domain::errors::ScoutError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ScoutConfig
/// 4. Applies environment variable overrides (SQLSCOUT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced environment
/// variable is missing, TOML parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use sqlscout::config::loader::load_config;
///
/// let config = load_config("sqlscout.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ScoutConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ScoutError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ScoutError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ScoutConfig = toml::from_str(&contents)
        .map_err(|e| ScoutError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ScoutError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ScoutError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ScoutError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using SQLSCOUT_* prefix
///
/// Environment variables follow the pattern SQLSCOUT_<SECTION>_<KEY>, for
/// example SQLSCOUT_RUN_THROTTLE_LIMIT or SQLSCOUT_SQL_PASSWORD. List values
/// (servers, skip steps) are comma-separated.
fn apply_env_overrides(config: &mut ScoutConfig) -> Result<()> {
    // Run overrides
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_SERVERS") {
        config.run.servers = split_list(&val);
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_OUTPUT_DIRECTORY") {
        config.run.output_directory = val;
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_LOG_DIRECTORY") {
        config.run.log_directory = Some(val);
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_THROTTLE_LIMIT") {
        config.run.throttle_limit = val.parse().map_err(|_| {
            ScoutError::Configuration(format!("SQLSCOUT_RUN_THROTTLE_LIMIT is not a number: {val}"))
        })?;
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_DRY_RUN") {
        config.run.dry_run = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_SKIP_STEPS") {
        config.run.skip_steps = split_list(&val);
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_SERVER_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.run.server_timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("SQLSCOUT_RUN_LOG_LEVEL") {
        config.run.log_level = val;
    }

    // Export overrides
    if let Ok(val) = std::env::var("SQLSCOUT_EXPORT_CHUNK_SIZE") {
        if let Ok(size) = val.parse() {
            config.export.chunk_size = size;
        }
    }
    if let Ok(val) = std::env::var("SQLSCOUT_EXPORT_RETRY_BACKOFF_MS") {
        if let Ok(ms) = val.parse() {
            config.export.retry_backoff_ms = ms;
        }
    }
    if let Ok(val) = std::env::var("SQLSCOUT_EXPORT_OUTPUT_MODE") {
        config.export.output_mode = match val.to_lowercase().as_str() {
            "append" => OutputMode::Append,
            "replace" => OutputMode::Replace,
            other => {
                return Err(ScoutError::Configuration(format!(
                    "SQLSCOUT_EXPORT_OUTPUT_MODE must be 'append' or 'replace', got '{other}'"
                )))
            }
        };
    }

    // SQL overrides
    if let Ok(val) = std::env::var("SQLSCOUT_SQL_USERNAME") {
        config.sql.username = Some(val);
    }
    if let Ok(val) = std::env::var("SQLSCOUT_SQL_PASSWORD") {
        config.sql.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("SQLSCOUT_SQL_QUERY_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.sql.query_timeout_seconds = secs;
        }
    }

    // OS overrides
    if let Ok(val) = std::env::var("SQLSCOUT_OS_USERNAME") {
        config.os.username = Some(val);
    }
    if let Ok(val) = std::env::var("SQLSCOUT_OS_PASSWORD") {
        config.os.password = Some(secret_string(val));
    }

    // Source overrides
    if let Ok(val) = std::env::var("SQLSCOUT_SOURCE_COMMAND_LOG_LENGTH") {
        if let Ok(len) = val.parse() {
            config.source.command_log_length = len;
        }
    }

    Ok(())
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
