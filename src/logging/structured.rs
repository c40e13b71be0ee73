//! Diagnostic logging setup using tracing
//!
//! Console output is always enabled. When `[logging] json_enabled` is set, a
//! JSON-formatted diagnostics file is additionally written to the log
//! directory through a non-blocking appender.
//!
//! # Example
//!
//! ```no_run
//! use sqlscout::logging::init_logging;
//! use sqlscout::config::LoggingSection;
//!
//! let config = LoggingSection::default();
//! let _guard = init_logging("info", &config, None).expect("Failed to initialize logging");
//! ```

use crate::config::LoggingSection;
use crate::domain::{Result, ScoutError};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Initialize diagnostic logging
///
/// # Arguments
///
/// * `log_level_str` - Log level as a string (trace, debug, info, warn, error)
/// * `config` - Logging configuration
/// * `json_dir` - Directory for the JSON diagnostics file, if enabled
///
/// # Returns
///
/// A `LoggingGuard` that must be kept alive for the duration of the program
pub fn init_logging(
    log_level_str: &str,
    config: &LoggingSection,
    json_dir: Option<&Path>,
) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sqlscout={log_level}")));

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(env_filter.clone());
    layers.push(console_layer.boxed());

    let file_guard = match (config.json_enabled, json_dir) {
        (true, Some(dir)) => {
            let rotation = match config.json_rotation.as_str() {
                "daily" => Rotation::DAILY,
                "hourly" => Rotation::HOURLY,
                _ => Rotation::NEVER,
            };

            std::fs::create_dir_all(dir).map_err(|e| {
                ScoutError::Configuration(format!(
                    "Failed to create log directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;

            let file_appender = RollingFileAppender::new(rotation, dir, "sqlscout.json.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(non_blocking)
                .with_filter(env_filter);

            layers.push(file_layer.boxed());
            Some(guard)
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| ScoutError::Other(format!("Logging already initialized: {e}")))?;

    tracing::debug!(
        json_enabled = config.json_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard))
}

/// Parse log level from string
pub(crate) fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ScoutError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}
