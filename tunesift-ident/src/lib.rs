//! tunesift-ident library interface
//!
//! Batch identification of audio files against a chain of recognition
//! providers. Items a provider identifies leave the working set; the rest
//! fall through to the next provider and end up in the report as unresolved.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{IdentError, IdentResult};
