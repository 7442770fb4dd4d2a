//! Reverse geocoding
//!
//! Turns a latitude/longitude into a human-readable place name. Lookups are
//! best-effort: callers treat every failure as "no name available".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

/// OpenStreetMap Nominatim reverse endpoint.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Default bound on a single lookup.
pub const DEFAULT_GEOCODER_TIMEOUT: Duration = Duration::from_secs(5);

/// Nominatim requires an identifying agent.
const USER_AGENT: &str = concat!("iss-tracker/", env!("CARGO_PKG_VERSION"));

/// Country-level detail.
const ZOOM: &str = "4";

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("geocoder timed out")]
    Timeout,

    #[error("geocoder returned HTTP {0}")]
    Status(u16),

    #[error("geocoder request failed: {0}")]
    Transport(String),

    #[error("geocoder reply not understood: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ResolverError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ResolverError::Timeout
        } else if err.is_decode() {
            ResolverError::Decode(err.to_string())
        } else {
            ResolverError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// Place name at the coordinates; `Ok(None)` when there is none
    /// (open ocean, polar regions).
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<String>, ResolverError>;
}

#[derive(Debug, Deserialize)]
struct ReverseReply {
    display_name: Option<String>,
    error: Option<String>,
}

/// Nominatim reverse-geocoding client.
pub struct NominatimResolver {
    client: Client,
    url: String,
}

impl NominatimResolver {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn request_url(&self, latitude: f64, longitude: f64) -> Result<Url, ResolverError> {
        Url::parse_with_params(
            &self.url,
            &[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
                ("zoom", ZOOM.to_string()),
                ("accept-language", "en".to_string()),
            ],
        )
        .map_err(|e| ResolverError::Transport(format!("invalid geocoder url: {e}")))
    }
}

#[async_trait]
impl GeoResolver for NominatimResolver {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<String>, ResolverError> {
        let url = self.request_url(latitude, longitude)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ResolverError::Status(response.status().as_u16()));
        }

        let reply: ReverseReply = response.json().await?;
        if let Some(reason) = reply.error {
            tracing::debug!(latitude, longitude, reason = %reason, "No place at coordinates");
            return Ok(None);
        }
        Ok(reply.display_name.filter(|name| !name.trim().is_empty()))
    }
}

/// Resolver that never finds a name, for offline runs.
pub struct NoopResolver;

#[async_trait]
impl GeoResolver for NoopResolver {
    async fn resolve(&self, _latitude: f64, _longitude: f64) -> Result<Option<String>, ResolverError> {
        Ok(None)
    }
}
