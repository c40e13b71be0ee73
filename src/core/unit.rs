//! Server processing unit
//!
//! Runs every registry step against one server, in order, and reports into
//! the run accumulators. A unit never returns an error: retrieval failures
//! and budget overruns move it into [`UnitState::Aborted`], after which no
//! further step is attempted.

use crate::adapters::{DataSource, FetchRequest};
use crate::config::RunConfig;
use crate::core::accumulator::{EntryKind, RunAccumulators, RunEntry};
use crate::core::export::ExportEngine;
use crate::core::registry;
use crate::domain::{ServerName, StepId};
use crate::log_step_start;
use crate::logging::RunLog;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a unit stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Data retrieval failed for `step`
    StepFailed { step: StepId, message: String },
    /// The server budget was exceeded before `step`
    TimedOut { step: StepId, elapsed: Duration },
}

/// Fail-fast state of a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Running,
    Aborted(AbortReason),
}

impl UnitState {
    pub fn is_running(&self) -> bool {
        matches!(self, UnitState::Running)
    }
}

/// Result of processing one server
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub server: ServerName,
    pub state: UnitState,
    /// Steps whose data was retrieved
    pub steps_collected: usize,
    pub elapsed: Duration,
}

impl UnitOutcome {
    pub fn succeeded(&self) -> bool {
        self.state.is_running()
    }
}

/// Processes servers one at a time; shared by all scheduler workers
pub struct ServerUnit {
    config: Arc<RunConfig>,
    source: Arc<dyn DataSource>,
    exporter: Arc<ExportEngine>,
    accumulators: Arc<RunAccumulators>,
    log: Arc<RunLog>,
}

impl ServerUnit {
    pub fn new(
        config: Arc<RunConfig>,
        source: Arc<dyn DataSource>,
        exporter: Arc<ExportEngine>,
        accumulators: Arc<RunAccumulators>,
        log: Arc<RunLog>,
    ) -> Self {
        Self {
            config,
            source,
            exporter,
            accumulators,
            log,
        }
    }

    /// Collect every non-skipped step from `server`
    pub async fn run(&self, server: ServerName) -> UnitOutcome {
        let started = Instant::now();
        let budget = self.config.tunables().server_budget;
        let mut state = UnitState::Running;
        let mut steps_collected = 0;

        self.log.info(format!("{server}: collection started"));

        for step in registry::steps() {
            if !state.is_running() {
                break;
            }

            if self.config.is_skipped(step.id) {
                self.log.info(format!("{server} / {}: skipped", step.id));
                continue;
            }

            let elapsed = started.elapsed();
            if budget_exceeded(elapsed, budget) {
                let message = format!(
                    "server budget of {budget:?} exceeded after {elapsed:.1?}; remaining steps not attempted"
                );
                self.log
                    .warn(format!("[TIMEOUT] {server} / {}: {message}", step.id));
                self.accumulators.record(
                    RunEntry::new(EntryKind::Timeout, server.clone(), message).with_step(step.id),
                );
                state = UnitState::Aborted(AbortReason::TimedOut {
                    step: step.id,
                    elapsed,
                });
                continue;
            }

            log_step_start!(self.log, server, step.id);

            let request = FetchRequest {
                step,
                server: &server,
                credential: self.config.credential_for(step.source),
                timeout: self.config.tunables().sql_query_timeout,
            };

            match self.source.fetch(request).await {
                Ok(result) => {
                    steps_collected += 1;
                    self.exporter.export(&result, step, &server).await;
                }
                Err(e) => {
                    let message = e.to_string();
                    self.log
                        .error(format!("[STEP-FAIL] {server} / {}: {message}", step.id));
                    self.accumulators.record(
                        RunEntry::new(EntryKind::StepFailed, server.clone(), message.clone())
                            .with_step(step.id),
                    );
                    state = UnitState::Aborted(AbortReason::StepFailed {
                        step: step.id,
                        message,
                    });
                }
            }
        }

        let elapsed = started.elapsed();
        match &state {
            UnitState::Running => {
                self.accumulators.record_success(server.clone());
                self.log.info(format!(
                    "{server}: completed {steps_collected} steps in {:.1}s",
                    elapsed.as_secs_f64()
                ));
            }
            UnitState::Aborted(reason) => {
                let step = match reason {
                    AbortReason::StepFailed { step, .. } | AbortReason::TimedOut { step, .. } => {
                        step
                    }
                };
                self.log.warn(format!(
                    "{server}: aborted at {step} after {:.1}s ({steps_collected} steps collected)",
                    elapsed.as_secs_f64()
                ));
            }
        }

        UnitOutcome {
            server,
            state,
            steps_collected,
            elapsed,
        }
    }
}

/// A budget that has been used up exactly still allows the next step
fn budget_exceeded(elapsed: Duration, budget: Duration) -> bool {
    elapsed > budget
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use crate::core::export::{CsvFileSink, ExportSettings};
    use crate::domain::{CollectionResult, SourceError, SourceKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records calls; fails the configured step
    struct StubSource {
        fail_on: Option<StepId>,
        calls: Mutex<Vec<(StepId, Option<String>)>>,
    }

    #[async_trait]
    impl DataSource for StubSource {
        async fn fetch(&self, request: FetchRequest<'_>) -> Result<CollectionResult, SourceError> {
            self.calls.lock().unwrap().push((
                request.step.id,
                request.credential.map(|c| c.username().to_string()),
            ));
            if self.fail_on == Some(request.step.id) {
                return Err(SourceError::QueryFailed("Invalid object name".to_string()));
            }
            Ok(CollectionResult::empty())
        }
    }

    fn unit(dir: &TempDir, config: RunConfig, source: Arc<StubSource>) -> (ServerUnit, Arc<RunAccumulators>) {
        let log = Arc::new(RunLog::open(dir.path().join("run.log")).unwrap());
        let accumulators = Arc::new(RunAccumulators::new());
        let exporter = Arc::new(ExportEngine::new(
            Arc::new(CsvFileSink::default()),
            ExportSettings::from_run_config(&config),
            Arc::clone(&accumulators),
            Arc::clone(&log),
        ));
        let unit = ServerUnit::new(
            Arc::new(config),
            source,
            exporter,
            Arc::clone(&accumulators),
            log,
        );
        (unit, accumulators)
    }

    #[test_case(999, false ; "within budget")]
    #[test_case(1000, false ; "budget exactly reached")]
    #[test_case(1001, true ; "budget exceeded")]
    fn test_budget_exceeded(elapsed_ms: u64, expected: bool) {
        assert_eq!(
            budget_exceeded(Duration::from_millis(elapsed_ms), Duration::from_secs(1)),
            expected
        );
    }

    #[tokio::test]
    async fn test_credentials_follow_source_kind() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig::builder(["sql01"], dir.path().join("out"))
            .sql_credential(crate::domain::Credential::from_parts("sql_user", "x").unwrap())
            .os_credential(crate::domain::Credential::from_parts("os_user", "y").unwrap())
            .build()
            .unwrap();
        let source = Arc::new(StubSource {
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        });
        let (unit, acc) = unit(&dir, config, Arc::clone(&source));

        let outcome = unit.run(ServerName::new("sql01").unwrap()).await;

        assert!(outcome.succeeded());
        assert_eq!(acc.successes().len(), 1);
        for (step, user) in source.calls.lock().unwrap().iter() {
            let expected = match registry::step(*step).source {
                SourceKind::Sql => "sql_user",
                SourceKind::Os => "os_user",
            };
            assert_eq!(user.as_deref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_steps() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig::builder(["sql01"], dir.path().join("out"))
            .build()
            .unwrap();
        let source = Arc::new(StubSource {
            fail_on: Some(StepId::SqlConfiguration),
            calls: Mutex::new(Vec::new()),
        });
        let (unit, acc) = unit(&dir, config, Arc::clone(&source));

        let outcome = unit.run(ServerName::new("sql01").unwrap()).await;

        assert!(matches!(
            outcome.state,
            UnitState::Aborted(AbortReason::StepFailed {
                step: StepId::SqlConfiguration,
                ..
            })
        ));
        let steps: Vec<StepId> = source.calls.lock().unwrap().iter().map(|c| c.0).collect();
        assert_eq!(
            steps,
            vec![
                StepId::HostOs,
                StepId::HostVolumes,
                StepId::SqlInstanceInfo,
                StepId::SqlConfiguration
            ]
        );
        assert!(acc.successes().is_empty());
        let entries = acc.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::StepFailed);
        assert_eq!(entries[0].step, Some(StepId::SqlConfiguration));
    }

    #[tokio::test]
    async fn test_zero_remaining_budget_times_out_first_step() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig::builder(["sql01"], dir.path().join("out"))
            .server_budget(Duration::from_nanos(1))
            .build()
            .unwrap();
        let source = Arc::new(StubSource {
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        });
        let (unit, acc) = unit(&dir, config, Arc::clone(&source));

        let outcome = unit.run(ServerName::new("sql01").unwrap()).await;

        assert!(!outcome.succeeded());
        assert!(source.calls.lock().unwrap().is_empty());
        let entries = acc.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Timeout);
        assert_eq!(entries[0].step, Some(StepId::HostOs));
    }
}
