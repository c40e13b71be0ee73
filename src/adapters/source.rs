//! Data source abstraction
//!
//! A data source retrieves the records of one collection step from one
//! server. It is the only component that talks to the estate.

use crate::core::registry::CollectionStep;
use crate::domain::{CollectionResult, Credential, ServerName, SourceError};
use async_trait::async_trait;
use std::time::Duration;

/// One retrieval request
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Step being collected
    pub step: &'a CollectionStep,
    /// Target server
    pub server: &'a ServerName,
    /// Credential for the step's source kind; `None` means ambient identity
    pub credential: Option<&'a Credential>,
    /// Deadline for the call
    pub timeout: Duration,
}

/// Retrieves inventory data for a (server, step) pair
///
/// Implementations must be safe to call concurrently for different servers.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Run the step's query against the server
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the server can't be reached, the query
    /// fails, the call exceeds `request.timeout`, or the response can't be
    /// read as a record set.
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<CollectionResult, SourceError>;
}
