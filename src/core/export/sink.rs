//! Chunk sinks
//!
//! A sink appends one chunk of records to a destination file. The export
//! engine owns chunking, retries and verification; the sink only writes.

use crate::domain::context::ResultExt;
use crate::domain::record::cell_text;
use crate::domain::{Record, Result, ScoutError};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Destination for exported chunks
pub trait ChunkSink: Send + Sync {
    /// Append `records` to `path`, creating the file on first write
    ///
    /// `columns` fixes the column order; a record missing a column gets an
    /// empty cell.
    fn write_chunk(&self, path: &Path, columns: &[String], records: &[Record]) -> Result<()>;

    /// Header of an existing, non-empty destination; `None` when the next
    /// write will create it
    fn existing_columns(&self, path: &Path) -> Result<Option<Vec<String>>>;

    /// Remove `path`; a missing file is not an error
    fn remove(&self, path: &Path) -> Result<()>;

    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;
}

/// Delimited text file sink
///
/// A header row is written only when the destination is new or empty, so
/// successive chunks and successive runs never repeat it.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    delimiter: u8,
}

impl CsvFileSink {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvFileSink {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl ChunkSink for CsvFileSink {
    fn write_chunk(&self, path: &Path, columns: &[String], records: &[Record]) -> Result<()> {
        let needs_header = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(Vec::new());

        if needs_header {
            writer.write_record(columns)?;
        }
        for record in records {
            writer.write_record(
                columns
                    .iter()
                    .map(|column| record.get(column).map(cell_text).unwrap_or_default()),
            )?;
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| ScoutError::Export(format!("CSV buffer flush failed: {e}")))?;

        // One write per chunk keeps a failed attempt from leaving half a chunk.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.write_all(&buffer)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    fn existing_columns(&self, path: &Path) -> Result<Option<Vec<String>>> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err::<Option<Vec<String>>, _>(e)
                    .with_context(|| format!("Failed to inspect {}", path.display()));
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut header = csv::StringRecord::new();
        if !reader.read_record(&mut header)? {
            return Ok(None);
        }
        Ok(Some(header.iter().map(str::to_string).collect()))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err::<(), _>(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
