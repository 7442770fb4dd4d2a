//! Inertial → Earth-fixed conversion
//!
//! Positions arrive in the J2000 inertial frame, which does not rotate with
//! the Earth. Longitude is therefore the right ascension minus Greenwich Mean
//! Sidereal Time at the sample's epoch; without that correction the ground
//! track drifts by ~15° per hour.
//!
//! The Earth is modelled as a sphere of radius [`EARTH_RADIUS_KM`]; latitude
//! is geocentric and altitude is measured above that sphere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::epoch::Epoch;
use types::sample::Position;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Mean Earth radius used for altitude (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Julian date of the Unix epoch (1970-01-01T00:00:00Z).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian date of J2000.0 (2000-01-01T12:00:00 TT, taken as UTC here).
const J2000_JD: f64 = 2_451_545.0;

/// GMST at J2000.0 in degrees (IAU 1982, linear term only).
const GMST_AT_J2000_DEG: f64 = 280.460_618_37;

/// Earth rotation in degrees per day relative to the stars.
const GMST_RATE_DEG_PER_DAY: f64 = 360.985_647_366_29;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Geodetic position
// ---------------------------------------------------------------------------

/// Latitude/longitude in degrees and altitude in km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// [-90, 90]
    pub latitude: f64,
    /// [-180, 180)
    pub longitude: f64,
    pub altitude: f64,
}

/// Greenwich Mean Sidereal Time in degrees, normalized to [0, 360).
pub fn gmst_degrees(at: DateTime<Utc>) -> f64 {
    let unix_seconds = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) * 1e-9;
    let days_since_j2000 = unix_seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD - J2000_JD;
    (GMST_AT_J2000_DEG + GMST_RATE_DEG_PER_DAY * days_since_j2000).rem_euclid(360.0)
}

/// Convert an inertial position at `epoch` into Earth-fixed coordinates.
pub fn to_geodetic(position: &Position, epoch: &Epoch) -> Geodetic {
    let r = position.magnitude();

    let latitude = if r > 0.0 {
        (position.z / r).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        0.0
    };

    let right_ascension = position.y.atan2(position.x).to_degrees();
    let longitude = normalize_longitude(right_ascension - gmst_degrees(epoch.datetime()));

    Geodetic {
        latitude,
        longitude,
        altitude: r - EARTH_RADIUS_KM,
    }
}

/// Wrap any angle in degrees into [-180, 180).
fn normalize_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
