//! Chunked export with bounded retries
//!
//! The engine never returns an error: every problem becomes an entry in the
//! run accumulators and a line in the run log.
//!
//! Sink calls touch the filesystem, so they run on tokio's blocking pool and
//! never stall the workers driving other servers.

use super::sink::ChunkSink;
use crate::config::{OutputMode, RunConfig};
use crate::core::accumulator::{EntryKind, RunAccumulators, RunEntry};
use crate::core::registry::CollectionStep;
use crate::domain::{CollectionResult, Record, Result, ScoutError, ServerName};
use crate::log_retry_attempt;
use crate::logging::RunLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Write attempts per chunk, including the first
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Delay before retry `retry` (1-indexed): `base_ms * 2^(retry - 1)`
pub fn retry_delay(base_ms: u64, retry: u32) -> Duration {
    let factor = 2u64.saturating_pow(retry.saturating_sub(1));
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Engine settings taken from the run configuration
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub output_directory: PathBuf,
    pub chunk_size: usize,
    pub retry_backoff_base_ms: u64,
    pub dry_run: bool,
    pub output_mode: OutputMode,
    pub file_extension: String,
}

impl ExportSettings {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            output_directory: config.output_directory().to_path_buf(),
            chunk_size: config.tunables().chunk_size,
            retry_backoff_base_ms: config.tunables().retry_backoff_base_ms,
            dry_run: config.dry_run(),
            output_mode: config.output_mode(),
            file_extension: config.file_extension().to_string(),
        }
    }
}

/// What an export call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export
    Empty,
    /// The destination could not take this result; nothing was written
    Rejected,
    /// Dry run; nothing written
    DryRun { records: usize },
    /// Chunks were written (some may have failed)
    Written {
        chunks_written: usize,
        chunks_failed: usize,
        records_written: usize,
    },
}

/// Writes collection results to per-(step, server) files
pub struct ExportEngine {
    sink: Arc<dyn ChunkSink>,
    settings: ExportSettings,
    accumulators: Arc<RunAccumulators>,
    log: Arc<RunLog>,
}

impl ExportEngine {
    pub fn new(
        sink: Arc<dyn ChunkSink>,
        settings: ExportSettings,
        accumulators: Arc<RunAccumulators>,
        log: Arc<RunLog>,
    ) -> Self {
        Self {
            sink,
            settings,
            accumulators,
            log,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Destination path for a step and server
    pub fn destination(&self, step: &CollectionStep, server: &ServerName) -> PathBuf {
        self.settings
            .output_directory
            .join(step.file_name(server, &self.settings.file_extension))
    }

    /// Export `result` for `step` on `server`
    pub async fn export(
        &self,
        result: &CollectionResult,
        step: &CollectionStep,
        server: &ServerName,
    ) -> ExportOutcome {
        if result.is_empty() {
            self.log
                .debug(format!("{server} / {}: no records, nothing to export", step.id));
            return ExportOutcome::Empty;
        }

        let path = self.destination(step, server);

        if self.settings.dry_run {
            let message = format!(
                "would export {} records to file {}",
                result.len(),
                path.display()
            );
            self.log
                .info(format!("[DRY-RUN] {server} / {}: {message}", step.id));
            self.accumulators.record(
                RunEntry::new(EntryKind::DryRun, server.clone(), message).with_step(step.id),
            );
            return ExportOutcome::DryRun {
                records: result.len(),
            };
        }

        if self.settings.output_mode == OutputMode::Replace {
            let sink = Arc::clone(&self.sink);
            let target = path.clone();
            if let Err(e) = on_blocking_pool(move || sink.remove(&target)).await {
                self.reject(
                    step,
                    server,
                    format!("could not replace existing {}: {e}", path.display()),
                );
                return ExportOutcome::Rejected;
            }
        }

        let columns = match self.resolve_columns(&path, result.columns()).await {
            Ok(columns) => columns,
            Err(message) => {
                self.reject(step, server, message);
                return ExportOutcome::Rejected;
            }
        };
        let chunk_size = self.settings.chunk_size.max(1);
        let total_chunks = result.len().div_ceil(chunk_size);
        let mut chunks_written = 0;
        let mut chunks_failed = 0;
        let mut records_written = 0;

        for (index, chunk) in result.records().chunks(chunk_size).enumerate() {
            match self.write_with_retry(&path, &columns, chunk).await {
                Ok(()) => {
                    chunks_written += 1;
                    records_written += chunk.len();
                }
                Err(e) => {
                    chunks_failed += 1;
                    let message = format!(
                        "{} chunk {}/{} ({} records) not written to {} for {} after {} attempts: {}",
                        step.prefix,
                        index + 1,
                        total_chunks,
                        chunk.len(),
                        path.display(),
                        server,
                        MAX_WRITE_ATTEMPTS,
                        e
                    );
                    self.log.error(format!("[EXPORT-FAIL] {message}"));
                    self.accumulators.record(
                        RunEntry::new(EntryKind::ExportFail, server.clone(), message)
                            .with_step(step.id),
                    );
                }
            }
        }

        let sink = Arc::clone(&self.sink);
        let target = path.clone();
        let exists = on_blocking_pool(move || Ok(sink.exists(&target)))
            .await
            .unwrap_or(false);
        if !exists {
            let message = format!("{} missing after export", path.display());
            self.log
                .error(format!("[VERIFY-FAIL] {server} / {}: {message}", step.id));
            self.accumulators.record(
                RunEntry::new(EntryKind::VerifyFail, server.clone(), message).with_step(step.id),
            );
        }

        self.log.info(format!(
            "{server} / {}: exported {records_written} of {} records to {}",
            step.id,
            result.len(),
            path.display()
        ));

        ExportOutcome::Written {
            chunks_written,
            chunks_failed,
            records_written,
        }
    }

    /// Column order for the rows of this export
    ///
    /// Appending to a file with a header reuses that header's order; a result
    /// with a column the header lacks can't be appended.
    async fn resolve_columns(
        &self,
        path: &Path,
        columns: Vec<String>,
    ) -> std::result::Result<Vec<String>, String> {
        let sink = Arc::clone(&self.sink);
        let target = path.to_path_buf();
        let header = on_blocking_pool(move || sink.existing_columns(&target))
            .await
            .map_err(|e| format!("could not read header of {}: {e}", path.display()))?;

        let Some(header) = header else {
            return Ok(columns);
        };

        let unknown: Vec<&str> = columns
            .iter()
            .filter(|c| !header.contains(c))
            .map(String::as_str)
            .collect();
        if unknown.is_empty() {
            Ok(header)
        } else {
            Err(format!(
                "columns [{}] are not in the header of existing {}; nothing appended",
                unknown.join(", "),
                path.display()
            ))
        }
    }

    fn reject(&self, step: &CollectionStep, server: &ServerName, message: String) {
        self.log
            .error(format!("[EXPORT-FAIL] {server} / {}: {message}", step.id));
        self.accumulators.record(
            RunEntry::new(EntryKind::ExportFail, server.clone(), message).with_step(step.id),
        );
    }

    async fn write_with_retry(&self, path: &Path, columns: &[String], chunk: &[Record]) -> Result<()> {
        let path: Arc<Path> = Arc::from(path);
        let columns: Arc<[String]> = Arc::from(columns);
        let chunk: Arc<[Record]> = Arc::from(chunk);

        let mut attempt = 1;
        loop {
            let sink = Arc::clone(&self.sink);
            let (p, c, r) = (Arc::clone(&path), Arc::clone(&columns), Arc::clone(&chunk));
            match on_blocking_pool(move || sink.write_chunk(&p, &c, &r)).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < MAX_WRITE_ATTEMPTS => {
                    let delay = retry_delay(self.settings.retry_backoff_base_ms, attempt);
                    log_retry_attempt!(
                        self.log,
                        attempt + 1,
                        MAX_WRITE_ATTEMPTS,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Run a filesystem call on the blocking pool
async fn on_blocking_pool<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScoutError::Export(format!("export task failed: {e}")))?
}
