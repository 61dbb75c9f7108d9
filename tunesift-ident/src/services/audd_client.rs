//! AudD acoustic search client
//!
//! Uploads the audio file with an API token and maps the AudD reply onto an
//! [`Outcome`]:
//!
//! | reply                                   | outcome                    |
//! |-----------------------------------------|----------------------------|
//! | `status: "success"`, `result: null`     | `Miss`                     |
//! | `status: "success"`, result record      | `Hit` (artist, title, album, link) |
//! | `status: "error"` with error code 900/901 | `Error(Unauthorized)`    |
//! | `status: "error"` with other error code | `Error(Transient)`         |
//! | `status: "error"` without error details | `Error(Unknown)`           |
//! | any other status, or no status          | `Error(Unknown)`           |
//!
//! Error code explanations: <https://docs.audd.io/#common-errors>

use crate::error::IdentError;
use crate::models::{Item, Outcome, Payload};
use crate::services::credentials::CredentialProvider;
use crate::services::provider::RecognitionProvider;
use crate::services::rate_limiter::{Pacing, RateLimiter};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("tunesift/", env!("CARGO_PKG_VERSION"));

/// AudD error codes meaning the token was rejected or missing
const CREDENTIAL_ERROR_CODES: [i64; 2] = [900, 901];

/// AudD API response
#[derive(Debug, Clone, Deserialize)]
pub struct AudDResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<AudDResult>,
    #[serde(default)]
    pub error: Option<AudDErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudDResult {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub song_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudDErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_message: String,
}

/// Acoustic search provider backed by the AudD API
pub struct AcousticSearchProvider {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
    rate_limiter: Arc<RateLimiter>,
}

impl AcousticSearchProvider {
    pub const NAME: &'static str = "audd";

    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        credentials: &dyn CredentialProvider,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, IdentError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IdentError::ProviderSetup(e.to_string()))?;

        let api_key = credentials.get_key(Self::NAME);
        if api_key.is_none() {
            tracing::warn!("No AudD API key available, every acoustic search will be unauthorized");
        }

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
            rate_limiter,
        })
    }

    /// Map a parsed response onto an outcome
    pub fn interpret(response: AudDResponse) -> Outcome {
        let Some(status) = response.status else {
            return Outcome::unknown("response without status");
        };

        match status.as_str() {
            "success" => match response.result {
                None => Outcome::Miss,
                Some(result) => Outcome::Hit(
                    Payload::new()
                        .with("artist", result.artist.unwrap_or_default())
                        .with("title", result.title.unwrap_or_default())
                        .with("album", result.album.unwrap_or_default())
                        .with("link", result.song_link.unwrap_or_default()),
                ),
            },
            "error" => match response.error {
                Some(error) => {
                    let message = format!("code {}: {}", error.error_code, error.error_message);
                    if CREDENTIAL_ERROR_CODES.contains(&error.error_code) {
                        Outcome::unauthorized(message)
                    } else {
                        Outcome::transient(message)
                    }
                }
                None => Outcome::unknown("error status without error details"),
            },
            other => Outcome::unknown(format!("unknown status '{}'", other)),
        }
    }

    async fn recognize(&self, item: &Item, api_key: &str) -> Outcome {
        let audio = match item.read_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Outcome::transient(format!("failed to read audio: {}", e)),
        };

        debug!(item = %item, bytes = audio.len(), "Submitting audio to AudD");

        let form = Form::new()
            .text("api_token", api_key.to_string())
            .part("file", Part::bytes(audio).file_name(item.file_name()));

        let response = match self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Outcome::transient(format!("request failed: {}", e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Outcome::transient(format!("failed to read response: {}", e)),
        };

        let parsed = match serde_json::from_str::<AudDResponse>(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Outcome::transient(format!("HTTP {}: {}", status, body))
            }
            Err(e) => return Outcome::transient(format!("malformed response: {}", e)),
        };
        if parsed.status.is_none() && !status.is_success() {
            return Outcome::transient(format!("HTTP {}: {}", status, body));
        }
        Self::interpret(parsed)
    }
}

#[async_trait]
impl RecognitionProvider for AcousticSearchProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn identify(&self, item: &Item) -> Outcome {
        // No request is sent without a key, so there is nothing to pace
        let Some(api_key) = self.api_key.as_deref() else {
            return Outcome::unauthorized("no AudD API key configured");
        };

        if self.rate_limiter.wait(Self::NAME).await == Pacing::Cancelled {
            return Outcome::cancelled();
        }
        self.recognize(item, api_key).await
    }
}
