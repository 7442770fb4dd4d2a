//! Ordered sample sets
//!
//! A `Dataset` is the unit the feed parser produces and the snapshot store
//! persists: samples sorted by epoch ascending, no duplicate epochs. The only
//! way to build one is [`Dataset::from_samples`], so every instance upholds
//! both invariants.

use crate::epoch::Epoch;
use crate::errors::DatasetError;
use crate::sample::Sample;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Sort samples by epoch and reject duplicates
    pub fn from_samples(mut samples: Vec<Sample>) -> Result<Self, DatasetError> {
        samples.sort_by(|a, b| a.epoch.cmp(&b.epoch));

        if let Some(pair) = samples.windows(2).find(|w| w[0].epoch == w[1].epoch) {
            return Err(DatasetError::DuplicateEpoch {
                epoch: pair[1].epoch.to_string(),
            });
        }

        Ok(Self { samples })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Exact epoch lookup (binary search)
    pub fn get(&self, epoch: &Epoch) -> Option<&Sample> {
        self.samples
            .binary_search_by(|s| s.epoch.cmp(epoch))
            .ok()
            .map(|idx| &self.samples[idx])
    }

    /// Up to `limit` samples starting at `offset`.
    ///
    /// An offset past the end yields an empty slice. `None` or `Some(0)`
    /// means everything remaining from `offset`.
    pub fn window(&self, limit: Option<usize>, offset: usize) -> &[Sample] {
        let len = self.samples.len();
        let start = offset.min(len);
        let end = match limit {
            Some(n) if n > 0 => start.saturating_add(n).min(len),
            _ => len,
        };
        &self.samples[start..end]
    }
}
