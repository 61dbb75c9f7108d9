//! Common error types for tunesift

use thiserror::Error;

/// Common result type for tunesift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across tunesift crates
#[derive(Error, Debug)]
pub enum Error {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
