//! State vector types
//!
//! A sample is one position/velocity pair in the Earth-centered inertial
//! frame, as published in the ephemeris feed.

use crate::epoch::Epoch;
use serde::{Deserialize, Serialize};

/// Position in kilometers (Earth-centered inertial frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance from Earth's center in kilometers
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Velocity in kilometers per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x_dot: f64,
    pub y_dot: f64,
    pub z_dot: f64,
}

impl Velocity {
    pub fn new(x_dot: f64, y_dot: f64, z_dot: f64) -> Self {
        Self { x_dot, y_dot, z_dot }
    }
}

/// One state vector keyed by its epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub epoch: Epoch,
    pub position: Position,
    pub velocity: Velocity,
}

impl Sample {
    pub fn new(epoch: Epoch, position: Position, velocity: Velocity) -> Self {
        Self {
            epoch,
            position,
            velocity,
        }
    }
}
