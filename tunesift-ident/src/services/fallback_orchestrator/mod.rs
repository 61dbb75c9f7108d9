//! Fallback identification orchestrator
//!
//! Drives the working set through the providers in priority order:
//!
//! ```text
//! W = all items
//! for each provider P:
//!     snapshot = take(W)
//!     for each item i in snapshot:
//!         Hit         → record (i, P, payload); i leaves the working set
//!         Miss, Error → i is retained for the next provider
//!     W = retained
//! unresolved = W
//! ```
//!
//! # Invariants
//! - Each pass iterates a snapshot taken at pass start; hits and retained
//!   items go to separate structures, swapped in at pass end.
//! - Each item receives at most one call per provider per run.
//! - Provider errors are item-local and never fail the run.
//!
//! # Cancellation
//! The token is checked before every dispatch. An in-flight call completes;
//! nothing further is dispatched and later passes are skipped. The partial
//! hit maps and the working set still aggregate into a valid report.

use crate::error::IdentError;
use crate::models::{
    ErrorKind, Item, Outcome, ProviderHits, Report, Unresolved, UnresolvedStatus,
};
use crate::services::provider::RecognitionProvider;
use crate::services::report_aggregator::{aggregate, verify_partition};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

mod statistics;

pub use statistics::PassStatistics;

/// Result of a complete (or cancelled) run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    /// One entry per pass that started, in provider order
    pub passes: Vec<PassStatistics>,
    pub cancelled: bool,
}

/// What one provider pass produced
struct PassResult {
    hits: ProviderHits,
    retained: Vec<Item>,
    statistics: PassStatistics,
    stopped: bool,
}

/// Fallback orchestrator service
#[derive(Default)]
pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn RecognitionProvider>>,
}

impl FallbackOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider to the fallback chain (lowest priority so far)
    pub fn with_provider(mut self, provider: Arc<dyn RecognitionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Identify `items` through the fallback chain
    ///
    /// # Errors
    /// Only [`IdentError::Invariant`], when the resulting report does not
    /// partition the input items.
    pub async fn run(
        &self,
        items: Vec<Item>,
        cancel_token: &CancellationToken,
    ) -> Result<RunOutcome, IdentError> {
        let items = dedupe(items);

        tracing::info!(
            items = items.len(),
            providers = ?self.provider_names(),
            "Starting identification run"
        );

        let mut working = items.clone();
        let mut attempted: HashSet<Item> = HashSet::new();
        let mut hit_maps = Vec::with_capacity(self.providers.len());
        let mut passes = Vec::with_capacity(self.providers.len());
        let mut cancelled = false;

        for provider in &self.providers {
            if cancel_token.is_cancelled() {
                cancelled = true;
                tracing::warn!(
                    provider = provider.name(),
                    "Run cancelled, skipping remaining provider passes"
                );
                break;
            }
            if working.is_empty() {
                tracing::debug!(provider = provider.name(), "Working set empty, pass skipped");
                continue;
            }

            let snapshot = std::mem::take(&mut working);
            let pass = run_pass(provider.as_ref(), snapshot, &mut attempted, cancel_token).await;

            tracing::info!("Pass complete: {}", pass.statistics.display_string());

            hit_maps.push(pass.hits);
            passes.push(pass.statistics);
            working = pass.retained;

            if pass.stopped {
                cancelled = true;
                tracing::warn!("Run cancelled, remaining items left unresolved");
                break;
            }
        }

        let leftovers: Vec<Unresolved> = working
            .into_iter()
            .map(|item| {
                let status = if attempted.contains(&item) {
                    UnresolvedStatus::Unmatched
                } else {
                    UnresolvedStatus::NotAttempted
                };
                Unresolved { item, status }
            })
            .collect();

        let report = aggregate(&hit_maps, &leftovers)?;
        verify_partition(&items, &report)?;

        tracing::info!(
            identified = report.hits.len(),
            unresolved = report.unresolved.len(),
            cancelled,
            "Identification run finished"
        );

        Ok(RunOutcome {
            report,
            passes,
            cancelled,
        })
    }
}

/// One provider pass over a working-set snapshot
async fn run_pass(
    provider: &dyn RecognitionProvider,
    snapshot: Vec<Item>,
    attempted: &mut HashSet<Item>,
    cancel_token: &CancellationToken,
) -> PassResult {
    let start_time = Instant::now();
    let name = provider.name();
    let mut statistics = PassStatistics::new(name, snapshot.len());
    let mut hits = ProviderHits::new(name);
    let mut retained = Vec::with_capacity(snapshot.len());
    let mut stopped = false;

    tracing::info!(provider = name, queued = snapshot.len(), "Starting provider pass");

    let mut pending = snapshot.into_iter();
    while let Some(item) = pending.next() {
        if cancel_token.is_cancelled() {
            retained.push(item);
            retained.extend(pending.by_ref());
            stopped = true;
            break;
        }

        match provider.identify(&item).await {
            Outcome::Hit(payload) => {
                tracing::info!(item = %item, provider = name, payload = ?payload, "HIT");
                statistics.record_hit();
                attempted.insert(item.clone());
                hits.hits.push((item, payload));
            }
            Outcome::Miss => {
                tracing::debug!(item = %item, provider = name, "Not hit");
                statistics.record_miss();
                attempted.insert(item.clone());
                retained.push(item);
            }
            Outcome::Error {
                kind: ErrorKind::Cancelled,
                ..
            } => {
                retained.push(item);
                retained.extend(pending.by_ref());
                stopped = true;
                break;
            }
            Outcome::Error { kind, message } => {
                if kind == ErrorKind::Unknown {
                    tracing::error!(
                        item = %item,
                        provider = name,
                        kind = %kind,
                        "Unrecognized provider response, skipping: {}",
                        message
                    );
                } else {
                    tracing::warn!(
                        item = %item,
                        provider = name,
                        kind = %kind,
                        "Provider error, skipping: {}",
                        message
                    );
                }
                statistics.record_error(kind);
                attempted.insert(item.clone());
                retained.push(item);
            }
        }
    }

    if stopped {
        statistics.not_dispatched = retained.len() - (statistics.attempted - statistics.hits);
    }
    statistics.elapsed_ms = start_time.elapsed().as_millis() as u64;

    PassResult {
        hits,
        retained,
        statistics,
        stopped,
    }
}

/// Drop repeated items, keeping first occurrence order
fn dedupe(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::with_capacity(items.len());
    let total = items.len();
    let unique: Vec<Item> = items.into_iter().filter(|i| seen.insert(i.clone())).collect();
    if unique.len() < total {
        tracing::warn!(
            duplicates = total - unique.len(),
            "Duplicate items submitted, each is identified once"
        );
    }
    unique
}
