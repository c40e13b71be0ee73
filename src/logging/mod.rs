//! Logging and observability
//!
//! Two complementary sinks:
//! - [`RunLog`]: the per-run log file (`<timestamp> [<SEVERITY>] <message>`),
//!   passed explicitly to every component that reports progress
//! - [`init_logging`]: `tracing` console output and optional JSON diagnostics
//!
//! Every [`RunLog`] line is also emitted as a `tracing` event, so console
//! output mirrors the run log.

pub mod run_log;
pub mod structured;

pub use run_log::{RunLog, Severity};
pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt to a run log
///
/// # Example
///
/// ```no_run
/// use sqlscout::log_retry_attempt;
/// use sqlscout::logging::RunLog;
///
/// let log = RunLog::open("/tmp/run.log").unwrap();
/// log_retry_attempt!(log, 2, 3, "disk full", 1000);
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($log:expr, $attempt:expr, $max_attempts:expr, $reason:expr, $delay_ms:expr) => {
        $log.warn(format!(
            "Retrying write (attempt {}/{}) in {}ms: {}",
            $attempt, $max_attempts, $delay_ms, $reason
        ))
    };
}

/// Log the start of a collection step to a run log
#[macro_export]
macro_rules! log_step_start {
    ($log:expr, $server:expr, $step:expr) => {
        $log.info(format!("{} / {}: collecting", $server, $step))
    };
}
