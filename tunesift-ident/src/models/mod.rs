//! Data models for identification runs

pub mod item;
pub mod outcome;
pub mod report;

pub use item::{Item, ItemMetadata};
pub use outcome::{ErrorKind, Outcome, Payload, PayloadField};
pub use report::{Identification, ProviderHits, Report, Unresolved, UnresolvedStatus};
