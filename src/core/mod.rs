//! Core business logic for sqlscout.
//!
//! # Modules
//!
//! - [`registry`] - the ordered catalogue of collection steps
//! - [`unit`] - per-server processing with fail-fast and a time budget
//! - [`scheduler`] - sequential or bounded-parallel execution of units
//! - [`export`] - chunked, retried export to delimited files
//! - [`accumulator`] - shared success and failure collections
//! - [`summary`] - run outcome and exit status
//! - [`coordinator`] - wiring of the above for one run
//!
//! # Collection Workflow
//!
//! 1. **Validate**: build an immutable [`RunConfig`](crate::config::RunConfig)
//! 2. **Schedule**: hand each server to a unit, at most `throttle` at a time
//! 3. **Collect**: for every non-skipped step, query the server
//! 4. **Export**: append the records to `<prefix>_<server>.csv` in chunks
//! 5. **Report**: aggregate the accumulators into a [`RunSummary`]
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlscout::adapters::CommandSource;
//! use sqlscout::config::{load_config, RunConfig};
//! use sqlscout::core::CollectionCoordinator;
//! use sqlscout::logging::RunLog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sqlscout.toml")?;
//! let run_config = RunConfig::from_config(&config)?;
//! let log = Arc::new(RunLog::create(run_config.log_directory(), chrono::Local::now())?);
//! let source = Arc::new(CommandSource::new(&config.source, Arc::clone(&log)));
//!
//! let summary = CollectionCoordinator::new(run_config, source, log).execute().await;
//! std::process::exit(summary.exit_code());
//! # }
//! ```

pub mod accumulator;
pub mod coordinator;
pub mod export;
pub mod registry;
pub mod scheduler;
pub mod summary;
pub mod unit;

pub use accumulator::{EntryKind, RunAccumulators, RunEntry};
pub use coordinator::CollectionCoordinator;
pub use registry::CollectionStep;
pub use scheduler::Scheduler;
pub use summary::RunSummary;
pub use unit::{AbortReason, ServerUnit, UnitOutcome, UnitState};
