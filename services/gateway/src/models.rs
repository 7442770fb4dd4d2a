use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::service::LoadState;

/// Raw `/epochs` query; values are validated by [`EpochsQuery::pagination`]
/// so malformed input gets the JSON error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpochsQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl EpochsQuery {
    /// `(limit, offset)`. A negative limit means "no limit"; a negative
    /// offset is rejected.
    pub fn pagination(&self) -> Result<(Option<usize>, usize), AppError> {
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("limit must be an integer, got {raw:?}")))?;
                usize::try_from(n).ok()
            }
        };

        let offset = match self.offset.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("offset must be an integer, got {raw:?}")))?;
                usize::try_from(n)
                    .map_err(|_| AppError::BadRequest(format!("offset must not be negative, got {n}")))?
            }
        };

        Ok((limit, offset))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResponse {
    pub epoch: String,
    /// km/s
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub epoch: String,
    pub latitude: f64,
    pub longitude: f64,
    /// km above the mean Earth radius
    pub altitude: f64,
    pub geoposition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowResponse {
    pub epoch: String,
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub geoposition: String,
}

/// Time range and average speed of the loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub start: String,
    pub end: String,
    pub samples: usize,
    pub mean_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub state: LoadState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>, offset: Option<&str>) -> EpochsQuery {
        EpochsQuery {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
        }
    }

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(query(None, None).pagination().unwrap(), (None, 0));
        assert_eq!(query(Some(""), Some("")).pagination().unwrap(), (None, 0));
    }

    #[test]
    fn test_pagination_values() {
        assert_eq!(query(Some("10"), Some("5")).pagination().unwrap(), (Some(10), 5));
        assert_eq!(query(Some("0"), None).pagination().unwrap(), (Some(0), 0));
    }

    #[test]
    fn test_negative_limit_means_unbounded() {
        assert_eq!(query(Some("-3"), Some("2")).pagination().unwrap(), (None, 2));
    }

    #[test]
    fn test_bad_params_rejected() {
        assert!(matches!(
            query(None, Some("-1")).pagination(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query(Some("ten"), None).pagination(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query(None, Some("1.5")).pagination(),
            Err(AppError::BadRequest(_))
        ));
    }
}
