//! Snapshot Store contract
//!
//! A store owns exactly one persisted dataset at a time. `load` replaces it
//! wholesale; readers observe either the old or the new dataset, never a mix.
//! Storage-layer failures are always [`StoreError::Unavailable`] so callers
//! can tell "the store is down" from "that epoch does not exist".

use async_trait::async_trait;
use thiserror::Error;
use types::dataset::Dataset;
use types::epoch::Epoch;
use types::sample::Sample;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Epoch not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub(crate) fn not_loaded() -> Self {
        StoreError::Unavailable("no dataset loaded".to_string())
    }
}

// ── Contract ────────────────────────────────────────────────────────

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Whether a usable dataset is currently persisted.
    async fn exists(&self) -> Result<bool, StoreError>;

    /// Atomically replace the persisted dataset.
    async fn load(&self, dataset: Dataset) -> Result<(), StoreError>;

    /// Full dataset in epoch order.
    async fn all(&self) -> Result<Vec<Sample>, StoreError>;

    /// Up to `limit` samples from `offset` in epoch order.
    ///
    /// Offset past the end yields an empty vec; `None`/`Some(0)` means all
    /// remaining.
    async fn range(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Sample>, StoreError>;

    /// Exact epoch lookup.
    async fn get(&self, epoch: &Epoch) -> Result<Sample, StoreError>;

    /// Backend name, for logs.
    fn backend(&self) -> &'static str;
}

/// Exact lookup against an in-process dataset.
pub(crate) fn lookup(dataset: &Dataset, epoch: &Epoch) -> Result<Sample, StoreError> {
    dataset
        .get(epoch)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(epoch.to_string()))
}
