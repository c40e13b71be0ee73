//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod collect;
pub mod init;
pub mod validate;
