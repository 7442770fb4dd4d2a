//! In-process store
//!
//! Holds the dataset behind an `Arc` so `load` is a pointer swap: readers
//! that already cloned the old `Arc` finish against the old dataset.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::info;
use types::dataset::Dataset;
use types::epoch::Epoch;
use types::sample::Sample;

use crate::store::{lookup, SnapshotStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    current: RwLock<Option<Arc<Dataset>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Result<Arc<Dataset>, StoreError> {
        let guard = self
            .current
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        guard.clone().ok_or_else(StoreError::not_loaded)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn exists(&self) -> Result<bool, StoreError> {
        let guard = self
            .current
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(guard.is_some())
    }

    async fn load(&self, dataset: Dataset) -> Result<(), StoreError> {
        let samples = dataset.len();
        let next = Arc::new(dataset);
        let mut guard = self
            .current
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        *guard = Some(next);
        info!(samples, "Dataset loaded into memory store");
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Sample>, StoreError> {
        Ok(self.current()?.samples().to_vec())
    }

    async fn range(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Sample>, StoreError> {
        Ok(self.current()?.window(limit, offset).to_vec())
    }

    async fn get(&self, epoch: &Epoch) -> Result<Sample, StoreError> {
        let dataset = self.current()?;
        lookup(&dataset, epoch)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
