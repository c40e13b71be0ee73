//! Collection coordinator - main orchestrator of a run
//!
//! Wires the accumulators, export engine, server unit and scheduler together
//! for one validated [`RunConfig`], runs every server, and aggregates the
//! result into a [`RunSummary`].

use crate::adapters::DataSource;
use crate::config::RunConfig;
use crate::core::accumulator::RunAccumulators;
use crate::core::export::{ChunkSink, CsvFileSink, ExportEngine, ExportSettings};
use crate::core::scheduler::Scheduler;
use crate::core::summary::RunSummary;
use crate::core::unit::ServerUnit;
use crate::logging::RunLog;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Collection coordinator
pub struct CollectionCoordinator {
    config: Arc<RunConfig>,
    source: Arc<dyn DataSource>,
    sink: Arc<dyn ChunkSink>,
    log: Arc<RunLog>,
}

impl CollectionCoordinator {
    /// Create a coordinator writing delimited files with the configured delimiter
    pub fn new(config: RunConfig, source: Arc<dyn DataSource>, log: Arc<RunLog>) -> Self {
        let sink = Arc::new(CsvFileSink::new(config.delimiter()));
        Self {
            config: Arc::new(config),
            source,
            sink,
            log,
        }
    }

    /// Replace the chunk sink
    pub fn with_sink(mut self, sink: Arc<dyn ChunkSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run
    ///
    /// Never fails: every problem is recorded in the summary and the run log.
    pub async fn execute(&self) -> RunSummary {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        self.log_header(&run_id);

        let accumulators = Arc::new(RunAccumulators::new());
        let exporter = Arc::new(ExportEngine::new(
            Arc::clone(&self.sink),
            ExportSettings::from_run_config(&self.config),
            Arc::clone(&accumulators),
            Arc::clone(&self.log),
        ));
        let unit = Arc::new(ServerUnit::new(
            Arc::clone(&self.config),
            Arc::clone(&self.source),
            exporter,
            Arc::clone(&accumulators),
            Arc::clone(&self.log),
        ));
        let scheduler = Scheduler::new(
            self.config.throttle(),
            Arc::clone(&accumulators),
            Arc::clone(&self.log),
        );

        scheduler.run(self.config.servers(), unit).await;

        let summary = RunSummary::from_accumulators(
            run_id,
            self.config.servers(),
            &accumulators,
            self.config.dry_run(),
        )
        .with_duration(started.elapsed());

        summary.log_summary(&self.log);
        summary
    }

    fn log_header(&self, run_id: &str) {
        let skipped = if self.config.skip_set().is_empty() {
            "none".to_string()
        } else {
            self.config
                .skip_set()
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        };

        self.log.info(format!(
            "sqlscout {} run {run_id} starting",
            env!("CARGO_PKG_VERSION")
        ));
        self.log.info(format!(
            "Servers: {} | Throttle: {} | Dry run: {} | Skipped steps: {skipped} | Output: {} ({:?} mode)",
            self.config.servers().len(),
            self.config.throttle(),
            self.config.dry_run(),
            self.config.output_directory().display(),
            self.config.output_mode()
        ));
    }
}
