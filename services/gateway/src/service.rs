//! Query Service
//!
//! Answers every API question from the snapshot store, loading the feed
//! into the store on first use. The load is single-flight: concurrent first
//! callers share one fetch, and a failed attempt is not remembered, so the
//! next request tries again.
//!
//! ```text
//!  Uninitialized ──(store has data, or fetch+load ok)──► Ready
//!        ▲                        │
//!        └──────(any failure)─────┘
//! ```

use std::sync::Arc;

use feed::{FeedError, FeedSource};
use orbit::{Geodetic, OrbitError};
use persistence::{SnapshotStore, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use types::epoch::Epoch;
use types::sample::Sample;

use crate::clock::Clock;
use crate::models::{LocationResponse, NowResponse, SpeedResponse, SummaryResponse};
use crate::resolver::GeoResolver;

/// Geoposition reported when no place name is available.
pub const UNKNOWN_GEOPOSITION: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Uninitialized,
    Ready,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no sample at epoch {0}")]
    NotFound(String),

    #[error("dataset has no samples")]
    EmptyDataset,

    #[error("feed load failed: {0}")]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(epoch) => ServiceError::NotFound(epoch),
            other => ServiceError::Store(other),
        }
    }
}

impl From<OrbitError> for ServiceError {
    fn from(err: OrbitError) -> Self {
        match err {
            OrbitError::NotFound => ServiceError::EmptyDataset,
        }
    }
}

pub struct TrackerService {
    store: Arc<dyn SnapshotStore>,
    feed: Arc<dyn FeedSource>,
    resolver: Arc<dyn GeoResolver>,
    clock: Arc<dyn Clock>,
    loaded: OnceCell<()>,
}

impl TrackerService {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        feed: Arc<dyn FeedSource>,
        resolver: Arc<dyn GeoResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            feed,
            resolver,
            clock,
            loaded: OnceCell::new(),
        }
    }

    pub fn state(&self) -> LoadState {
        if self.loaded.initialized() {
            LoadState::Ready
        } else {
            LoadState::Uninitialized
        }
    }

    /// Make sure the store holds a dataset. Waits on an in-flight load
    /// instead of starting a second one.
    pub async fn ensure_loaded(&self) -> Result<(), ServiceError> {
        self.loaded
            .get_or_try_init(|| self.initialize())
            .await
            .map(|_| ())
    }

    /// Best-effort load at startup; failures are retried by the first request.
    pub async fn warm_up(&self) {
        match self.ensure_loaded().await {
            Ok(()) => info!(backend = self.store.backend(), "Dataset ready"),
            Err(e) => warn!(error = %e, "Startup load failed, will retry on first request"),
        }
    }

    async fn initialize(&self) -> Result<(), ServiceError> {
        match self.store.exists().await {
            Ok(true) => {
                info!(backend = self.store.backend(), "Reusing persisted dataset");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                error!(backend = self.store.backend(), error = %e, "Store check failed");
                return Err(e.into());
            }
        }

        let dataset = feed::fetch_dataset(self.feed.as_ref()).await.map_err(|e| {
            error!(source = self.feed.name(), error = %e, "Dataset load failed");
            e
        })?;
        let samples = dataset.len();

        self.store.load(dataset).await.map_err(|e| {
            error!(backend = self.store.backend(), error = %e, "Dataset store failed");
            e
        })?;

        info!(backend = self.store.backend(), samples, "Dataset loaded from feed");
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Samples in epoch order, optionally windowed.
    pub async fn list(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Sample>, ServiceError> {
        self.ensure_loaded().await?;
        let samples = match (limit, offset) {
            (None, 0) => self.store.all().await?,
            _ => self.store.range(limit, offset).await?,
        };
        Ok(samples)
    }

    /// Exact lookup; an epoch that does not parse cannot exist.
    pub async fn sample(&self, epoch: &str) -> Result<Sample, ServiceError> {
        self.ensure_loaded().await?;
        let key = Epoch::parse(epoch).map_err(|_| ServiceError::NotFound(epoch.to_string()))?;
        Ok(self.store.get(&key).await?)
    }

    pub async fn speed(&self, epoch: &str) -> Result<SpeedResponse, ServiceError> {
        let sample = self.sample(epoch).await?;
        Ok(SpeedResponse {
            epoch: sample.epoch.to_string(),
            speed: orbit::speed(&sample.velocity),
        })
    }

    pub async fn location(&self, epoch: &str) -> Result<LocationResponse, ServiceError> {
        let sample = self.sample(epoch).await?;
        let position = orbit::to_geodetic(&sample.position, &sample.epoch);
        let geoposition = self.geoposition(&position).await;
        Ok(LocationResponse {
            epoch: sample.epoch.to_string(),
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
            geoposition,
        })
    }

    /// State at the sample nearest the clock's current instant.
    pub async fn now(&self) -> Result<NowResponse, ServiceError> {
        self.ensure_loaded().await?;
        let samples = self.store.all().await?;
        let at = self.clock.now();
        let nearest = orbit::nearest_epoch(&samples, at)?;
        debug!(now = %at, nearest = %nearest.epoch, "Nearest epoch selected");

        let position = orbit::to_geodetic(&nearest.position, &nearest.epoch);
        let geoposition = self.geoposition(&position).await;
        Ok(NowResponse {
            epoch: nearest.epoch.to_string(),
            speed: orbit::speed(&nearest.velocity),
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
            geoposition,
        })
    }

    pub async fn summary(&self) -> Result<SummaryResponse, ServiceError> {
        self.ensure_loaded().await?;
        let samples = self.store.all().await?;
        let (first, last) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ServiceError::EmptyDataset),
        };
        let mean_speed = orbit::mean_speed(&samples).ok_or(ServiceError::EmptyDataset)?;
        Ok(SummaryResponse {
            start: first.epoch.to_string(),
            end: last.epoch.to_string(),
            samples: samples.len(),
            mean_speed,
        })
    }

    async fn geoposition(&self, position: &Geodetic) -> String {
        match self.resolver.resolve(position.latitude, position.longitude).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                debug!(latitude = position.latitude, longitude = position.longitude, "No place name");
                UNKNOWN_GEOPOSITION.to_string()
            }
            Err(e) => {
                warn!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    error = %e,
                    "Geolocation lookup failed"
                );
                UNKNOWN_GEOPOSITION.to_string()
            }
        }
    }
}
