//! Data source integrations for sqlscout.
//!
//! - [`source`] - the [`DataSource`] trait every retrieval goes through
//! - [`command`] - [`CommandSource`], which runs configured query programs
//!
//! # Design Pattern
//!
//! Adapters isolate the estate behind a trait so the collection core can be
//! exercised with mock implementations.
//!
//! ```rust,no_run
//! use sqlscout::adapters::CommandSource;
//! use sqlscout::config::SourceSection;
//! use sqlscout::logging::RunLog;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SourceSection {
//!     sql_command: vec!["sqlcmd-json".into(), "-S".into(), "{server}".into(), "-Q".into(), "{query}".into()],
//!     os_command: vec!["cim-json".into(), "{server}".into(), "{query}".into()],
//!     command_log_length: 256,
//! };
//! let log = Arc::new(RunLog::open("/tmp/sqlscout.log")?);
//! let source = CommandSource::new(&config, log);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod source;

pub use command::CommandSource;
pub use source::{DataSource, FetchRequest};
