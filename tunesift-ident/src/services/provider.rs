//! Recognition provider trait
//!
//! Every provider maps one call for one item to an [`Outcome`]. Transport
//! and response-shape problems are folded into `Outcome::Error`, so a
//! provider call never fails the batch.
//!
//! # Example
//! ```rust,ignore
//! use tunesift_ident::services::RecognitionProvider;
//!
//! let outcome = provider.identify(&item).await;
//! match outcome {
//!     Outcome::Hit(payload) => println!("{}: {:?}", item, payload),
//!     Outcome::Miss => println!("{}: not found", item),
//!     Outcome::Error { kind, message } => println!("{}: {} ({})", item, kind, message),
//! }
//! ```

use crate::models::{Item, Outcome};
use async_trait::async_trait;

#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    /// Provider name, used for rate limiting, logging and the report
    fn name(&self) -> &str;

    /// Run one recognition call for `item`
    ///
    /// Implementations wait on their rate limiter exactly once before each
    /// network request, whatever the outcome.
    async fn identify(&self, item: &Item) -> Outcome;
}
