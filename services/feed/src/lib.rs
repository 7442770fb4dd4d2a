//! Feed Service
//!
//! Downloads the published ISS ephemeris and turns it into a validated
//! [`Dataset`]:
//! - `source`: where documents come from (HTTP with timeout, or fixed text)
//! - `parser`: OEM XML → ordered, duplicate-free samples (all-or-nothing)
//!
//! # Architecture
//!
//! ```text
//!  FeedSource::fetch ──► parser::parse ──► Dataset
//!   (timeout-bound)      (validates)       (sorted, unique)
//! ```

pub mod parser;
pub mod source;

use std::time::Instant;

use tracing::{info, warn};
use types::dataset::Dataset;

pub use parser::{parse, ParseError};
pub use source::{FeedSource, FetchError, HttpFeedSource, StaticFeedSource, DEFAULT_FEED_URL};

/// Errors from one fetch-and-parse attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Fetch the feed once and parse it.
pub async fn fetch_dataset(source: &dyn FeedSource) -> Result<Dataset, FeedError> {
    let started = Instant::now();

    let raw = source.fetch().await.map_err(|e| {
        warn!(source = source.name(), error = %e, "Feed fetch failed");
        e
    })?;

    let dataset = parser::parse(&raw).map_err(|e| {
        warn!(source = source.name(), bytes = raw.len(), error = %e, "Feed rejected");
        e
    })?;

    info!(
        source = source.name(),
        bytes = raw.len(),
        samples = dataset.len(),
        first = dataset.first().map(|s| s.epoch.as_str()).unwrap_or_default(),
        last = dataset.last().map(|s| s.epoch.as_str()).unwrap_or_default(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Feed fetched and parsed"
    );

    Ok(dataset)
}

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
