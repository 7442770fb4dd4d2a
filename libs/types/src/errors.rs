//! Error types for the data model
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Epoch parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EpochError {
    #[error("Invalid epoch {value:?}: expected YYYY-DDDTHH:MM:SS.sssZ")]
    Grammar { value: String },

    #[error("Invalid epoch {value:?}: {reason}")]
    OutOfRange { value: String, reason: String },
}

/// Dataset construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Duplicate epoch: {epoch}")]
    DuplicateEpoch { epoch: String },
}
