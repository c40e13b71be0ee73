//! Domain error types
//!
//! This module defines the error hierarchy for sqlscout.
//! Errors are domain-specific and don't expose third-party types.

use std::time::Duration;
use thiserror::Error;

/// Main sqlscout error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Data source errors (OS or SQL queries)
    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Data source errors
///
/// Errors raised while retrieving inventory data from a server. The concrete
/// client (query tool, driver) is hidden behind these variants.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Could not reach the server
    #[error("Failed to connect to {server}: {message}")]
    ConnectionFailed { server: String, message: String },

    /// The server rejected the supplied credential
    #[error("Authentication failed for {0}")]
    AuthenticationFailed(String),

    /// The query ran but failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The query did not finish within its timeout
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The query tool exited unsuccessfully
    #[error("Command exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    /// The query tool produced output that isn't a record set
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for ScoutError {
    fn from(err: std::io::Error) -> Self {
        ScoutError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ScoutError {
    fn from(err: serde_json::Error) -> Self {
        ScoutError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ScoutError {
    fn from(err: csv::Error) -> Self {
        ScoutError::Export(format!("CSV error: {err}"))
    }
}

impl From<toml::de::Error> for ScoutError {
    fn from(err: toml::de::Error) -> Self {
        ScoutError::Configuration(format!("TOML parse error: {err}"))
    }
}
