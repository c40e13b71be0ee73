//! Export of collection results
//!
//! - [`engine`] - chunking, bounded retries with exponential back-off, and
//!   post-export verification
//! - [`sink`] - the [`ChunkSink`] trait and the delimited-file sink

pub mod engine;
pub mod sink;

pub use engine::{retry_delay, ExportEngine, ExportOutcome, ExportSettings, MAX_WRITE_ATTEMPTS};
pub use sink::{ChunkSink, CsvFileSink};
