//! Where feed documents come from
//!
//! The production source is a plain HTTP GET against the published ephemeris;
//! the trait exists so the query service can be driven by a fixed document in
//! tests and offline runs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Published ISS ephemeris (CCSDS OEM, J2000 frame, 4-minute spacing).
pub const DEFAULT_FEED_URL: &str =
    "https://nasa-public-data.s3.amazonaws.com/iss-coords/current/ISS_OEM/ISS.OEM_J2K_EPH.xml";

/// Default bound on a single feed download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while downloading the feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("feed request to {url} timed out")]
    Timeout { url: String },

    #[error("feed request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("feed request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

impl FetchError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Download the raw feed document.
    async fn fetch(&self) -> Result<String, FetchError>;

    /// Human-readable origin, for logs.
    fn name(&self) -> &str;
}

/// Fetches the feed over HTTP with a bounded timeout.
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::from_reqwest(&url, e))?;
        Ok(Self { client, url })
    }

    /// Source pointed at [`DEFAULT_FEED_URL`].
    pub fn nasa() -> Result<Self, FetchError> {
        Self::new(DEFAULT_FEED_URL, DEFAULT_FETCH_TIMEOUT)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        debug!(url = %self.url, "Fetching feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Serves a fixed document; every fetch returns the same text.
pub struct StaticFeedSource {
    document: String,
}

impl StaticFeedSource {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        Ok(self.document.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
