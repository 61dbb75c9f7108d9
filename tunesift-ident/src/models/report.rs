//! Identification report structures

use super::{Item, Payload};
use serde::Serialize;

/// Hits produced by one provider pass, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHits {
    pub provider: String,
    pub hits: Vec<(Item, Payload)>,
}

impl ProviderHits {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            hits: Vec::new(),
        }
    }
}

/// One identified item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    pub item: Item,
    pub provider: String,
    pub payload: Payload,
}

/// Why an item ended up unresolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedStatus {
    /// At least one provider call completed without a hit
    Unmatched,
    /// The run was cancelled before any provider saw the item
    NotAttempted,
}

/// One item left without identification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub item: Item,
    pub status: UnresolvedStatus,
}

/// Final result of an identification run
///
/// `hits` and `unresolved` partition the run's input items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub hits: Vec<Identification>,
    pub unresolved: Vec<Unresolved>,
}

impl Report {
    pub fn hit_for(&self, item: &Item) -> Option<&Identification> {
        self.hits.iter().find(|h| &h.item == item)
    }

    pub fn unresolved_items(&self) -> impl Iterator<Item = &Item> {
        self.unresolved.iter().map(|u| &u.item)
    }

    /// Every item in the report, hits first
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.hits.iter().map(|h| &h.item).chain(self.unresolved_items())
    }

    pub fn len(&self) -> usize {
        self.hits.len() + self.unresolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
