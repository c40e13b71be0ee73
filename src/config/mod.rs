//! Configuration management for sqlscout.
//!
//! # Overview
//!
//! sqlscout reads a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SQLSCOUT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation before any server is contacted
//!
//! The file maps onto [`ScoutConfig`]. A run never uses it directly: it is
//! turned into an immutable [`RunConfig`] by [`RunConfig::from_config`], which
//! also creates the output/log directories and checks the output directory is
//! writable.
//!
//! # Example Configuration
//!
//! ```toml
//! [run]
//! servers = ["SQL01", "SQL02\\REPORTING"]
//! output_directory = "D:/inventory"
//! throttle_limit = 8
//! skip_steps = ["LinkedServers"]
//!
//! [export]
//! chunk_size = 5000
//! retry_backoff_ms = 500
//! output_mode = "append"
//!
//! [sql]
//! username = "svc_inventory"
//! password = "${SQLSCOUT_SQL_PASSWORD}"
//!
//! [source]
//! sql_command = ["sqlq", "--server", "{server}", "--timeout", "{timeout}", "--query", "{query}"]
//! os_command = ["cimq", "--host", "{server}", "--class", "{query}"]
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sqlscout::config::{load_config, RunConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sqlscout.toml")?;
//! let run = RunConfig::from_config(&config)?;
//! println!("{} servers, throttle {}", run.servers().len(), run.throttle());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod run;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use run::{RunConfig, RunConfigBuilder, ThrottleLimit, Tunables};
pub use schema::{
    ExportSection, LoggingSection, OsSection, OutputMode, RunSection, ScoutConfig, SourceSection,
    SqlSection,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
