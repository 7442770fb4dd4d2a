//! Nearest-epoch selection.

use chrono::{DateTime, Utc};
use thiserror::Error;
use types::sample::Sample;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrbitError {
    #[error("No samples to choose from")]
    NotFound,
}

/// Sample whose epoch is closest to `target`.
///
/// Ties go to the earlier epoch regardless of slice order.
pub fn nearest_epoch(samples: &[Sample], target: DateTime<Utc>) -> Result<&Sample, OrbitError> {
    samples
        .iter()
        .min_by(|a, b| {
            let da = (a.epoch.datetime() - target).abs();
            let db = (b.epoch.datetime() - target).abs();
            da.cmp(&db).then_with(|| a.epoch.cmp(&b.epoch))
        })
        .ok_or(OrbitError::NotFound)
}
