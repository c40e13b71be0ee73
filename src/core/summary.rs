//! Run summary and reporting
//!
//! Built once from the accumulators after the scheduler has returned.

use crate::core::accumulator::{RunAccumulators, RunEntry};
use crate::domain::ServerName;
use crate::logging::RunLog;
use std::collections::HashSet;
use std::time::Duration;

/// Outcome of a collection run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Identifier written in the run header
    pub run_id: String,

    /// Servers in the run configuration
    pub total_servers: usize,

    /// Servers that completed every non-skipped step
    pub successful_servers: usize,

    /// `total_servers - successful_servers`
    pub failed_servers: usize,

    /// Failure entries (everything but dry-run notices)
    pub failure_entries: usize,

    /// Dry-run notices
    pub notices: usize,

    /// Servers that did not succeed, in configuration order
    pub unsuccessful: Vec<ServerName>,

    /// Every accumulated entry
    pub entries: Vec<RunEntry>,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Whether this was a dry run
    pub dry_run: bool,
}

impl RunSummary {
    /// Aggregate the accumulators of a finished run
    pub fn from_accumulators(
        run_id: impl Into<String>,
        servers: &[ServerName],
        accumulators: &RunAccumulators,
        dry_run: bool,
    ) -> Self {
        let successes: HashSet<ServerName> = accumulators.successes().into_iter().collect();
        let entries = accumulators.entries();
        let failure_entries = entries.iter().filter(|e| e.kind.is_failure()).count();
        let unsuccessful: Vec<ServerName> = servers
            .iter()
            .filter(|s| !successes.contains(*s))
            .cloned()
            .collect();

        Self {
            run_id: run_id.into(),
            total_servers: servers.len(),
            successful_servers: successes.len(),
            failed_servers: servers.len().saturating_sub(successes.len()),
            failure_entries,
            notices: entries.len() - failure_entries,
            unsuccessful,
            entries,
            duration: Duration::ZERO,
            dry_run,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check if the run succeeded (no failed servers, no failure entries)
    pub fn is_successful(&self) -> bool {
        self.failure_entries == 0 && self.failed_servers == 0
    }

    /// Process exit status for the run
    pub fn exit_code(&self) -> i32 {
        if self.is_successful() {
            0
        } else {
            1
        }
    }

    /// Failure entries only
    pub fn failures(&self) -> impl Iterator<Item = &RunEntry> {
        self.entries.iter().filter(|e| e.kind.is_failure())
    }

    /// Write totals and every entry to the run log
    pub fn log_summary(&self, log: &RunLog) {
        log.info(format!(
            "Run {} finished in {:.1}s: {} servers, {} successful, {} failed, {} failure entries, {} notices",
            self.run_id,
            self.duration.as_secs_f64(),
            self.total_servers,
            self.successful_servers,
            self.failed_servers,
            self.failure_entries,
            self.notices
        ));

        for entry in &self.entries {
            if entry.kind.is_failure() {
                log.warn(entry.to_string());
            } else {
                log.info(entry.to_string());
            }
        }

        if self.is_successful() {
            log.info("Run outcome: SUCCESS");
        } else {
            log.error(format!(
                "Run outcome: FAILURE (unsuccessful servers: {})",
                self.unsuccessful
                    .iter()
                    .map(ServerName::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::accumulator::EntryKind;
    use crate::domain::StepId;

    fn servers(names: &[&str]) -> Vec<ServerName> {
        names.iter().map(|n| ServerName::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_all_successful() {
        let list = servers(&["a", "b"]);
        let acc = RunAccumulators::new();
        for s in &list {
            acc.record_success(s.clone());
        }

        let summary = RunSummary::from_accumulators("run-1", &list, &acc, false);

        assert!(summary.is_successful());
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.failed_servers, 0);
        assert!(summary.unsuccessful.is_empty());
    }

    #[test]
    fn test_dry_run_notices_do_not_fail_the_run() {
        let list = servers(&["a"]);
        let acc = RunAccumulators::new();
        acc.record_success(list[0].clone());
        acc.record(
            RunEntry::new(EntryKind::DryRun, list[0].clone(), "would export 3 records")
                .with_step(StepId::Databases),
        );

        let summary = RunSummary::from_accumulators("run-1", &list, &acc, true);

        assert!(summary.is_successful());
        assert_eq!(summary.notices, 1);
        assert_eq!(summary.failure_entries, 0);
    }

    #[test]
    fn test_export_failure_fails_run_but_not_server() {
        let list = servers(&["a"]);
        let acc = RunAccumulators::new();
        acc.record_success(list[0].clone());
        acc.record(RunEntry::new(EntryKind::ExportFail, list[0].clone(), "disk full"));

        let summary = RunSummary::from_accumulators("run-1", &list, &acc, false);

        assert_eq!(summary.successful_servers, 1);
        assert_eq!(summary.failed_servers, 0);
        assert!(!summary.is_successful());
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_unsuccessful_keeps_configuration_order() {
        let list = servers(&["a", "b", "c", "d"]);
        let acc = RunAccumulators::new();
        acc.record_success(list[1].clone());
        acc.record(RunEntry::new(EntryKind::Fatal, list[3].clone(), "panicked"));

        let summary = RunSummary::from_accumulators("run-1", &list, &acc, false);

        assert_eq!(summary.unsuccessful, servers(&["a", "c", "d"]));
        assert_eq!(summary.failed_servers, 3);
        assert_eq!(summary.failures().count(), 1);
    }
}
