//! Per-pass statistics
//!
//! Display: "fingerprint: 12 attempted, 7 hits, 4 misses, 1 errors"

use crate::models::ErrorKind;
use serde::Serialize;

/// Counters for one provider pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStatistics {
    /// Provider name
    pub provider: String,
    /// Items in the working set when the pass started
    pub queued: usize,
    /// Provider calls that completed
    pub attempted: usize,
    pub hits: usize,
    pub misses: usize,
    pub transient_errors: usize,
    pub unauthorized_errors: usize,
    pub unknown_errors: usize,
    /// Items left undispatched because the run was cancelled
    pub not_dispatched: usize,
    /// Wall time of the pass in milliseconds
    pub elapsed_ms: u64,
}

impl PassStatistics {
    pub fn new(provider: impl Into<String>, queued: usize) -> Self {
        Self {
            provider: provider.into(),
            queued,
            ..Self::default()
        }
    }

    pub fn record_hit(&mut self) {
        self.attempted += 1;
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.attempted += 1;
        self.misses += 1;
    }

    pub fn record_error(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Transient => self.transient_errors += 1,
            ErrorKind::Unauthorized => self.unauthorized_errors += 1,
            ErrorKind::Unknown => self.unknown_errors += 1,
            // Nothing was sent; counted via not_dispatched instead
            ErrorKind::Cancelled => return,
        }
        self.attempted += 1;
    }

    pub fn errors(&self) -> usize {
        self.transient_errors + self.unauthorized_errors + self.unknown_errors
    }

    pub fn display_string(&self) -> String {
        let mut line = format!(
            "{}: {} attempted, {} hits, {} misses, {} errors",
            self.provider,
            self.attempted,
            self.hits,
            self.misses,
            self.errors()
        );
        if self.not_dispatched > 0 {
            line.push_str(&format!(", {} not dispatched", self.not_dispatched));
        }
        line
    }
}
