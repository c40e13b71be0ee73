//! Error context extension trait
//!
//! Like `anyhow::Context`, but keeps library code on `Result<T, ScoutError>`.
//!
//! # Examples
//!
//! ```rust
//! use sqlscout::domain::Result;
//! use sqlscout::domain::context::ResultExt;
//!
//! fn read_server_list(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read server list {path}"))
//! }
//! ```

use crate::domain::errors::ScoutError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context computed only when an error occurs
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ScoutError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Keep the variant so callers can still match on the error category.
fn wrap(base: ScoutError, context: impl std::fmt::Display) -> ScoutError {
    match base {
        ScoutError::Configuration(m) => ScoutError::Configuration(format!("{context}: {m}")),
        ScoutError::Export(m) => ScoutError::Export(format!("{context}: {m}")),
        ScoutError::Io(m) => ScoutError::Io(format!("{context}: {m}")),
        other => ScoutError::Other(format!("{context}: {other}")),
    }
}
