//! Run accumulators
//!
//! The only state shared between concurrently running server units. Both
//! collections are append-only during a run and are read once, by the run
//! summary, after every unit has finished. Callers never lock anything
//! themselves.

use crate::domain::{ServerName, StepId};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Kind of an accumulated entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// Data retrieval for a step failed
    StepFailed,
    /// The per-server budget ran out before a step
    Timeout,
    /// A chunk could not be written after all attempts
    ExportFail,
    /// The destination file was missing after export
    VerifyFail,
    /// A server unit failed outside its step handling
    Fatal,
    /// Dry-run notice describing a skipped write
    DryRun,
}

impl EntryKind {
    /// Whether the entry counts against the run outcome
    pub fn is_failure(&self) -> bool {
        !matches!(self, EntryKind::DryRun)
    }

    /// Tag used in log lines
    pub fn tag(&self) -> &'static str {
        match self {
            EntryKind::StepFailed => "STEP-FAIL",
            EntryKind::Timeout => "TIMEOUT",
            EntryKind::ExportFail => "EXPORT-FAIL",
            EntryKind::VerifyFail => "VERIFY-FAIL",
            EntryKind::Fatal => "FATAL",
            EntryKind::DryRun => "DRY-RUN",
        }
    }
}

/// One failure or notice, tagged with its originating server and step
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunEntry {
    pub kind: EntryKind,
    pub server: ServerName,
    pub step: Option<StepId>,
    pub message: String,
}

impl RunEntry {
    pub fn new(kind: EntryKind, server: ServerName, message: impl Into<String>) -> Self {
        Self {
            kind,
            server,
            step: None,
            message: message.into(),
        }
    }

    pub fn with_step(mut self, step: StepId) -> Self {
        self.step = Some(step);
        self
    }
}

impl fmt::Display for RunEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(
                f,
                "[{}] {} / {}: {}",
                self.kind.tag(),
                self.server,
                step,
                self.message
            ),
            None => write!(f, "[{}] {}: {}", self.kind.tag(), self.server, self.message),
        }
    }
}

/// Concurrency-safe success and entry collections for one run
#[derive(Debug, Default)]
pub struct RunAccumulators {
    successes: Mutex<Vec<ServerName>>,
    entries: Mutex<Vec<RunEntry>>,
}

impl RunAccumulators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a server that completed every non-skipped step
    pub fn record_success(&self, server: ServerName) {
        lock(&self.successes).push(server);
    }

    /// Record a failure or notice
    pub fn record(&self, entry: RunEntry) {
        lock(&self.entries).push(entry);
    }

    /// Snapshot of successful servers, in insertion order
    pub fn successes(&self) -> Vec<ServerName> {
        lock(&self.successes).clone()
    }

    /// Snapshot of all entries, in insertion order
    pub fn entries(&self) -> Vec<RunEntry> {
        lock(&self.entries).clone()
    }

    pub fn success_count(&self) -> usize {
        lock(&self.successes).len()
    }

    pub fn failure_count(&self) -> usize {
        lock(&self.entries)
            .iter()
            .filter(|e| e.kind.is_failure())
            .count()
    }
}

// A panic elsewhere must not lose entries already recorded.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
