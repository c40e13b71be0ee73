//! Server identifier type with validation
//!
//! Target servers are addressed by the name the caller supplies, which for
//! SQL Server may include a named instance (`HOST\INSTANCE`) or a port
//! (`HOST,1433`). The name is passed through untouched to the data source;
//! a filesystem-safe form is derived for output file names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target server newtype wrapper
///
/// # Examples
///
/// ```
/// use sqlscout::domain::ids::ServerName;
/// use std::str::FromStr;
///
/// let server = ServerName::from_str("SQL01\\REPORTING").unwrap();
/// assert_eq!(server.as_str(), "SQL01\\REPORTING");
/// assert_eq!(server.file_stem(), "SQL01_REPORTING");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerName(String);

impl ServerName {
    /// Creates a new ServerName, trimming surrounding whitespace
    ///
    /// Returns `Err` if the trimmed name is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Server name cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the server name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form of the name used in output file names
    ///
    /// Every character outside `[A-Za-z0-9._-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServerName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ServerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
