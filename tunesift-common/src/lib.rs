//! # tunesift Common Library
//!
//! Shared code for the tunesift crates:
//! - Error type used across configuration and I/O
//! - Configuration loading (CLI → ENV → TOML → defaults)

pub mod config;
pub mod error;

pub use error::{Error, Result};
