//! Day-of-year UTC epochs
//!
//! Every state vector in the feed is keyed by an epoch of the form
//! `YYYY-DDDTHH:MM:SS.sssZ` (e.g. `2024-079T12:00:00.000Z`). Because the
//! format is fixed-width, lexicographic order on the raw string is the same as
//! chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::EpochError;

/// chrono format used to parse and render epochs.
pub const EPOCH_FORMAT: &str = "%Y-%jT%H:%M:%S%.3fZ";

/// Byte shape of a valid epoch; `d` stands for any ASCII digit.
const EPOCH_SHAPE: &[u8; 22] = b"dddd-dddTdd:dd:dd.dddZ";

/// A validated sample epoch
///
/// Keeps the raw feed string (the dataset key) together with the instant it
/// denotes. Serializes as the raw string and re-validates on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Epoch {
    raw: String,
    at: DateTime<Utc>,
}

impl Epoch {
    /// Parse an epoch string, rejecting anything outside the grammar
    pub fn parse(value: &str) -> Result<Self, EpochError> {
        let bytes = value.as_bytes();
        let shape_ok = bytes.len() == EPOCH_SHAPE.len()
            && bytes.iter().zip(EPOCH_SHAPE.iter()).all(|(b, s)| match s {
                b'd' => b.is_ascii_digit(),
                other => b == other,
            });
        if !shape_ok {
            return Err(EpochError::Grammar {
                value: value.to_string(),
            });
        }

        // Shape is already checked, so %.f only ever sees three digits here.
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%jT%H:%M:%S%.fZ").map_err(|e| {
            EpochError::OutOfRange {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            raw: value.to_string(),
            at: naive.and_utc(),
        })
    }

    /// Render an instant as an epoch (millisecond precision, truncated)
    pub fn from_datetime(at: DateTime<Utc>) -> Result<Self, EpochError> {
        Self::parse(&at.format(EPOCH_FORMAT).to_string())
    }

    /// Raw epoch string as it appears in the feed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The instant this epoch denotes
    pub fn datetime(&self) -> DateTime<Utc> {
        self.at
    }
}

impl Ord for Epoch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Epoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Epoch {
    type Err = EpochError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Epoch {
    type Error = EpochError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Epoch> for String {
    fn from(epoch: Epoch) -> Self {
        epoch.raw
    }
}
