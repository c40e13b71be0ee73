//! Per-run log file
//!
//! Every run writes exactly one log file named after its start time. Lines
//! have the form `<timestamp> [<SEVERITY>] <message>`. The log is an explicit
//! object shared through `Arc` by the scheduler, every server unit and the
//! export engine; writes are serialized internally so concurrent units never
//! interleave partial lines.

use crate::domain::{Result, ScoutError};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

/// Severity of a run log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" | "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(format!("Invalid severity: {s}")),
        }
    }
}

/// Append-only, timestamped, severity-tagged log file for one run
pub struct RunLog {
    path: PathBuf,
    min_severity: Severity,
    file: Mutex<File>,
}

impl RunLog {
    /// Create the run log in `dir`, named `sqlscout_<YYYYMMDD_HHMMSS>.log`
    pub fn create(dir: &Path, started: DateTime<Local>) -> Result<Self> {
        let path = dir.join(Self::file_name(started));
        Self::open(path)
    }

    /// Open (or create) a log file at an explicit path, appending
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                ScoutError::Configuration(format!(
                    "Failed to open run log {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            path,
            min_severity: Severity::Info,
            file: Mutex::new(file),
        })
    }

    /// Lines below `severity` are dropped
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Log file name for a run started at `started`
    pub fn file_name(started: DateTime<Local>) -> String {
        format!("sqlscout_{}.log", started.format("%Y%m%d_%H%M%S"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.write(Severity::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.write(Severity::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.write(Severity::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.write(Severity::Error, message.as_ref());
    }

    /// Write one line; the same message is emitted as a tracing event
    ///
    /// Embedded newlines are folded so one call is always one line.
    pub fn write(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "sqlscout::run", "{message}"),
            Severity::Info => tracing::info!(target: "sqlscout::run", "{message}"),
            Severity::Warn => tracing::warn!(target: "sqlscout::run", "{message}"),
            Severity::Error => tracing::error!(target: "sqlscout::run", "{message}"),
        }

        if severity < self.min_severity {
            return;
        }

        let line = format_line(Local::now(), severity, message);

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write run log");
        }
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog")
            .field("path", &self.path)
            .field("min_severity", &self.min_severity)
            .finish()
    }
}

fn format_line(at: DateTime<Local>, severity: Severity, message: &str) -> String {
    let flat: String = message
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(" | ");
    format!(
        "{} [{}] {}\n",
        at.format("%Y-%m-%d %H:%M:%S%.3f"),
        severity,
        flat
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_uses_start_time() {
        let started = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(RunLog::file_name(started), "sqlscout_20260304_050607.log");
    }

    #[test]
    fn test_line_format() {
        let at = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let line = format_line(at, Severity::Warn, "server sql01 timed out");
        assert_eq!(line, "2026-01-02 03:04:05.000 [WARN] server sql01 timed out\n");
    }

    #[test]
    fn test_multiline_message_is_one_line() {
        let at = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let line = format_line(at, Severity::Error, "first\nsecond\n");
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains("first | second"));
    }

    #[test]
    fn test_min_severity_filters() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::open(dir.path().join("run.log")).unwrap();
        log.debug("hidden");
        log.info("shown");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("[INFO] shown"));
    }

    #[test]
    fn test_concurrent_writes_keep_lines_whole() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(RunLog::open(dir.path().join("run.log")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.info(format!("worker {t} line {i} {}", "x".repeat(64)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 400);
        for line in lines {
            assert!(line.contains("[INFO] worker "), "mangled line: {line}");
            assert!(line.ends_with(&"x".repeat(64)));
        }
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("TRACE".parse::<Severity>().unwrap(), Severity::Debug);
        assert!("loud".parse::<Severity>().is_err());
    }
}
