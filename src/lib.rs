// sqlscout - SQL Server estate inventory collector
// Copyright (c) 2025 sqlscout Contributors
// Licensed under the MIT License

//! # sqlscout - SQL Server estate inventory collection
//!
//! sqlscout walks a list of SQL Server hosts, runs a fixed catalogue of
//! inventory queries against each (host OS, instance, configuration,
//! databases, files, logins, Agent jobs, linked servers), and writes every
//! result set to a delimited file per (step, server).
//!
//! ## Overview
//!
//! - **Bounded concurrency**: at most `throttle_limit` servers in flight
//! - **Fail-fast per server**: the first failed step ends that server's work
//! - **Per-server time budget**, checked between steps
//! - **Chunked export** with bounded retries and exponential back-off
//! - **One run log** shared by every worker, plus an exit status that
//!   reflects every recorded failure
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Registry, server units, scheduler, export and run summary
//! - [`adapters`] - Data sources (the query tools that talk to the estate)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Run log and diagnostic logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sqlscout::adapters::CommandSource;
//! use sqlscout::config::{load_config, RunConfig};
//! use sqlscout::core::CollectionCoordinator;
//! use sqlscout::logging::RunLog;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sqlscout.toml")?;
//!     let run_config = RunConfig::from_config(&config)?;
//!     let log = Arc::new(RunLog::create(run_config.log_directory(), chrono::Local::now())?);
//!     let source = Arc::new(CommandSource::new(&config.source, Arc::clone(&log)));
//!
//!     let summary = CollectionCoordinator::new(run_config, source, log).execute().await;
//!     println!(
//!         "{} of {} servers collected",
//!         summary.successful_servers, summary.total_servers
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Data Sources
//!
//! Anything that implements [`adapters::DataSource`] can feed the collection
//! core, which is how the test suite drives it without a live estate:
//!
//! ```rust
//! use async_trait::async_trait;
//! use sqlscout::adapters::{DataSource, FetchRequest};
//! use sqlscout::domain::{CollectionResult, SourceError};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl DataSource for Offline {
//!     async fn fetch(&self, request: FetchRequest<'_>) -> Result<CollectionResult, SourceError> {
//!         Err(SourceError::ConnectionFailed {
//!             server: request.server.to_string(),
//!             message: "offline".to_string(),
//!         })
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`] with [`domain::ScoutError`].
//! Nothing above the scheduler raises: per-server problems are recorded in
//! the run accumulators and surface through the run log and exit status.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
