//! Per-provider rate limiting
//!
//! Recognition services enforce a minimum spacing between requests. Each
//! provider gets its own slot with an independent interval; a call waits
//! until the interval since that provider's previous call has elapsed.
//!
//! The wait is a cooperative tokio timer, so a bound cancellation token can
//! interrupt it.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Result of a rate-limit wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Interval elapsed, the call may be issued
    Ready,
    /// Cancellation fired during the wait; the call must not be issued
    Cancelled,
}

struct ProviderSlot {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

/// Rate limiter keyed by provider name
#[derive(Default)]
pub struct RateLimiter {
    slots: HashMap<String, ProviderSlot>,
    cancel_token: Option<CancellationToken>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the minimum interval between calls to `provider`
    pub fn with_interval(mut self, provider: impl Into<String>, min_interval: Duration) -> Self {
        self.slots.insert(
            provider.into(),
            ProviderSlot {
                min_interval,
                last_request: Mutex::new(None),
            },
        );
        self
    }

    /// Let `cancel_token` interrupt pending waits
    pub fn with_cancellation(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = Some(cancel_token);
        self
    }

    /// Configured interval for `provider` (zero when unknown)
    pub fn interval(&self, provider: &str) -> Duration {
        self.slots
            .get(provider)
            .map(|slot| slot.min_interval)
            .unwrap_or(Duration::ZERO)
    }

    /// Wait until `provider` may be called again
    ///
    /// Holding the slot lock across the sleep keeps concurrent callers of the
    /// same provider strictly spaced.
    pub async fn wait(&self, provider: &str) -> Pacing {
        let Some(slot) = self.slots.get(provider) else {
            return Pacing::Ready;
        };

        let mut last = slot.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < slot.min_interval {
                let wait_time = slot.min_interval - elapsed;
                tracing::debug!(provider, "Rate limiting: waiting {:?}", wait_time);

                match &self.cancel_token {
                    Some(token) => {
                        tokio::select! {
                            _ = tokio::time::sleep(wait_time) => {}
                            _ = token.cancelled() => {
                                tracing::debug!(provider, "Rate-limit wait cancelled");
                                return Pacing::Cancelled;
                            }
                        }
                    }
                    None => tokio::time::sleep(wait_time).await,
                }
            }
        }

        *last = Some(Instant::now());
        Pacing::Ready
    }
}
