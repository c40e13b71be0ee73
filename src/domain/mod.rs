//! Domain models and types for sqlscout.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`ServerName`], [`StepId`])
//! - **Collected data** ([`Record`], [`CollectionResult`])
//! - **Credentials** ([`Credential`])
//! - **Error types** ([`ScoutError`], [`SourceError`]) and the [`Result`] alias
//!
//! # Example
//!
//! ```rust
//! use sqlscout::domain::{ServerName, StepId};
//! use std::str::FromStr;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = ServerName::new("SQL01\\REPORTING")?;
//! let step = StepId::from_str("agent_jobs")?;
//! assert_eq!(step, StepId::AgentJobs);
//! assert_eq!(server.file_stem(), "SQL01_REPORTING");
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod credential;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;
pub mod step;

pub use credential::Credential;
pub use errors::{ScoutError, SourceError};
pub use ids::ServerName;
pub use record::{CollectionResult, Record};
pub use result::Result;
pub use step::{SourceKind, StepId};
