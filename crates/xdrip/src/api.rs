//! HTTP client for the xDrip+ local web service.
//!
//! Wraps `GET {base}/sgv.json` using [`reqwest`] and walks the candidate
//! list in order until one candidate yields a well-formed reading.

use std::time::Duration;

use async_trait::async_trait;
use diabuddy_core::Reading;
use reqwest::StatusCode;

use crate::messages::SgvEntry;
use crate::source::GlucoseSource;

/// Path of the most-recent-samples endpoint.
pub const SGV_PATH: &str = "/sgv.json";

/// Candidates tried when none are configured: the same device via two
/// loopback spellings, then the host loopback as seen from an Android
/// emulator.
pub const DEFAULT_BASE_URLS: [&str; 3] = [
    "http://127.0.0.1:17580",
    "http://localhost:17580",
    "http://10.0.2.2:17580",
];

/// Per-candidate request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a single candidate was skipped.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request itself failed (connect, DNS, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200.
    #[error("xDrip+ returned HTTP {0}")]
    HttpStatus(u16),

    /// The body was not an array whose first element is a valid entry.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The array was empty.
    #[error("No readings in response")]
    Empty,
}

/// Multi-endpoint xDrip+ client.
pub struct XDripClient {
    client: reqwest::Client,
    base_urls: Vec<String>,
    timeout: Duration,
}

impl XDripClient {
    /// Client over [`DEFAULT_BASE_URLS`] with the default timeout.
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_BASE_URLS.iter().map(|u| u.to_string()).collect())
    }

    /// Client over an explicit, ordered candidate list.
    pub fn with_base_urls(base_urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_urls,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-candidate request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query one candidate for its most recent reading.
    pub async fn fetch_from(&self, base_url: &str) -> Result<Reading, SourceError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), SGV_PATH);

        let response = self.client.get(&url).timeout(self.timeout).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SourceError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_latest(&body)
    }
}

impl Default for XDripClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GlucoseSource for XDripClient {
    async fn fetch_latest(&self) -> Option<Reading> {
        for base_url in &self.base_urls {
            match self.fetch_from(base_url).await {
                Ok(reading) => {
                    tracing::debug!(
                        base_url = %base_url,
                        value = reading.value(),
                        "Fetched glucose reading",
                    );
                    return Some(reading);
                }
                Err(e) => {
                    tracing::debug!(base_url = %base_url, error = %e, "Candidate skipped");
                }
            }
        }

        tracing::debug!(candidates = self.base_urls.len(), "No candidate returned a reading");
        None
    }
}

/// Decode the newest entry from an `/sgv.json` body.
///
/// Only the first element has to be well-formed; older entries are not
/// inspected.
fn parse_latest(body: &[u8]) -> Result<Reading, SourceError> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(body)?;
    let first = entries.into_iter().next().ok_or(SourceError::Empty)?;
    let entry: SgvEntry = serde_json::from_value(first)?;
    Ok(entry.into())
}
