//! Orbit: Coordinate Math for State Vectors
//!
//! Provides pure computation over validated samples:
//! - Scalar speed from a velocity vector
//! - Earth-fixed latitude/longitude/altitude from an inertial position
//! - Nearest-epoch selection against a target instant
//!
//! # Determinism
//! All functions are pure: no system time, no I/O. Callers pass the instant
//! they care about explicitly.

pub mod kinematics;
pub mod geodetic;
pub mod nearest;

pub use geodetic::{gmst_degrees, to_geodetic, Geodetic, EARTH_RADIUS_KM};
pub use kinematics::{mean_speed, speed};
pub use nearest::{nearest_epoch, OrbitError};

/// Crate version constant
pub const ORBIT_VERSION: &str = "1.0.0";
