//! Error types for tunesift-ident
//!
//! Per-item provider failures are not errors at this level: they are
//! [`Outcome::Error`](crate::models::Outcome) values and never abort a run.
//! Everything here is fatal to the invocation.

use crate::services::file_scanner::ScanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentError {
    /// Report membership is inconsistent (orchestrator defect)
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Item enumeration failed
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Provider client could not be constructed
    #[error("Provider setup error: {0}")]
    ProviderSetup(String),

    /// Report could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type IdentResult<T> = Result<T, IdentError>;
