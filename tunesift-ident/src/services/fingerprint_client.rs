//! Fingerprint recognition client
//!
//! Uploads raw audio to a fingerprint recognition endpoint (a Shazam-style
//! gateway) and maps the reply onto an [`Outcome`]:
//!
//! - no `track` (or `track: null`) → `Miss`
//! - a track record → `Hit` with `title`, `subtitle`, `share_subject`
//! - transport failure, HTTP error status or malformed JSON → `Error(Transient)`
//! - HTTP 401/403 → `Error(Unauthorized)`

use crate::error::IdentError;
use crate::models::{Item, Outcome, Payload};
use crate::services::provider::RecognitionProvider;
use crate::services::rate_limiter::{Pacing, RateLimiter};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("tunesift/", env!("CARGO_PKG_VERSION"));

/// Fingerprint service response
#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintResponse {
    #[serde(default)]
    pub track: Option<FingerprintTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintTrack {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub share: Option<TrackShare>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackShare {
    pub subject: Option<String>,
}

/// Fingerprint-based recognition provider
pub struct FingerprintProvider {
    http_client: Client,
    endpoint: String,
    rate_limiter: Arc<RateLimiter>,
}

impl FingerprintProvider {
    pub const NAME: &'static str = "fingerprint";

    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, IdentError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IdentError::ProviderSetup(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            rate_limiter,
        })
    }

    /// Map a parsed response onto an outcome
    pub fn interpret(response: FingerprintResponse) -> Outcome {
        match response.track {
            None => Outcome::Miss,
            Some(track) => {
                let share_subject = track.share.and_then(|s| s.subject).unwrap_or_default();
                Outcome::Hit(
                    Payload::new()
                        .with("title", track.title.unwrap_or_default())
                        .with("subtitle", track.subtitle.unwrap_or_default())
                        .with("share_subject", share_subject),
                )
            }
        }
    }

    async fn recognize(&self, item: &Item) -> Outcome {
        let audio = match item.read_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Outcome::transient(format!("failed to read audio: {}", e)),
        };

        debug!(item = %item, bytes = audio.len(), "Submitting audio for fingerprint recognition");

        let response = match self
            .http_client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Outcome::transient(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Outcome::unauthorized(format!("endpoint rejected request ({})", status));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Outcome::transient(format!("HTTP {}: {}", status, body));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Outcome::transient(format!("failed to read response: {}", e)),
        };

        match serde_json::from_str::<FingerprintResponse>(&body) {
            Ok(parsed) => Self::interpret(parsed),
            Err(e) => Outcome::transient(format!("malformed response: {}", e)),
        }
    }
}

#[async_trait]
impl RecognitionProvider for FingerprintProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn identify(&self, item: &Item) -> Outcome {
        if self.rate_limiter.wait(Self::NAME).await == Pacing::Cancelled {
            return Outcome::cancelled();
        }
        self.recognize(item).await
    }
}
