//! Speed derived from velocity vectors.

use types::sample::{Sample, Velocity};

/// Magnitude of a velocity vector in km/s.
pub fn speed(velocity: &Velocity) -> f64 {
    (velocity.x_dot * velocity.x_dot
        + velocity.y_dot * velocity.y_dot
        + velocity.z_dot * velocity.z_dot)
        .sqrt()
}

/// Arithmetic mean of the sample speeds, `None` for an empty slice.
pub fn mean_speed(samples: &[Sample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: f64 = samples.iter().map(|s| speed(&s.velocity)).sum();
    Some(total / samples.len() as f64)
}
