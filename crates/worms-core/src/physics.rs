//! Mass and ballistic formulas shared by every massive entity.

use crate::error::{Error, Result};
use crate::types::Position;
use std::f64::consts::PI;

/// Standard gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.80665;

/// Most samples a single flight, fall or search may take
pub const MAX_SAMPLES: u64 = 1_000_000;

/// Mass of a homogeneous sphere: ρ·4/3·π·r³
pub fn sphere_mass(density: f64, radius: f64) -> f64 {
    density * 4.0 / 3.0 * PI * radius.powi(3)
}

/// Radius of a homogeneous sphere of the given mass
pub fn sphere_radius(density: f64, mass: f64) -> f64 {
    (3.0 * mass / (4.0 * PI * density)).cbrt()
}

/// Launch speed produced by pushing with `force` for half a second
pub fn launch_velocity(force: f64, mass: f64) -> f64 {
    force / mass * 0.5
}

/// A launch from a fixed origin.
///
/// `flight_time` is the closed-form time to return to the launch height.
/// `step` clamps to it; `position_at` does not, and is what terrain-aware
/// flights sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ballistic {
    pub origin: Position,
    pub velocity: f64,
    pub direction: f64,
}

impl Ballistic {
    pub fn new(origin: Position, force: f64, mass: f64, direction: f64) -> Self {
        Self {
            origin,
            velocity: launch_velocity(force, mass),
            direction,
        }
    }

    pub fn flight_time(&self) -> f64 {
        2.0 * self.velocity * self.direction.sin() / GRAVITY
    }

    /// Whether the launch has any upward push at all
    pub fn can_fly(&self) -> bool {
        let time = self.flight_time();
        self.velocity.is_finite() && self.velocity > 0.0 && time.is_finite() && time > 0.0
    }

    /// Unclamped position `t` seconds after launch
    pub fn position_at(&self, t: f64) -> Position {
        let x = self.origin.x + self.velocity * self.direction.cos() * t;
        let y = self.origin.y + self.velocity * self.direction.sin() * t - GRAVITY / 2.0 * t * t;
        Position::new(x, y)
    }

    /// Position `t` seconds into the jump, clamped to the flight time.
    pub fn step(&self, t: f64) -> Result<Position> {
        validate_time(t)?;
        if !self.can_fly() {
            return Ok(self.origin);
        }
        Ok(self.position_at(t.min(self.flight_time())))
    }

    /// Time until the flight sinks below height `floor`; zero if it starts
    /// there and never rises above it
    pub fn time_to_sink_below(&self, floor: f64) -> f64 {
        let rise = self.velocity * self.direction.sin();
        let drop = self.origin.y - floor;
        let discriminant = rise * rise + 2.0 * GRAVITY * drop;
        if discriminant < 0.0 {
            return 0.0;
        }
        ((rise + discriminant.sqrt()) / GRAVITY).max(0.0)
    }

    pub fn endpoint(&self) -> Position {
        if !self.can_fly() {
            return self.origin;
        }
        self.position_at(self.flight_time())
    }
}

/// Reject negative or non-finite times
pub fn validate_time(t: f64) -> Result<()> {
    if !t.is_finite() || t < 0.0 {
        return Err(Error::InvalidArgument(format!("illegal time {}", t)));
    }
    Ok(())
}

/// Reject time steps that could never advance a flight
pub fn validate_time_step(time_step: f64) -> Result<()> {
    if !time_step.is_finite() || time_step <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "illegal time step {}",
            time_step
        )));
    }
    Ok(())
}

/// Samples of size `step` needed to cover `span`, end points included.
///
/// Fails when the step is not positive or is too fine to cover the span
/// within `MAX_SAMPLES`.
pub fn sample_count(span: f64, step: f64) -> Result<u64> {
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidArgument(format!("illegal step {}", step)));
    }
    if !span.is_finite() || span < 0.0 {
        return Err(Error::InvalidArgument(format!("illegal span {}", span)));
    }
    let count = (span / step).ceil() + 1.0;
    if count > MAX_SAMPLES as f64 {
        return Err(Error::InvalidArgument(format!(
            "step {} needs more than {} samples to cover {}",
            step, MAX_SAMPLES, span
        )));
    }
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch(direction: f64) -> Ballistic {
        Ballistic::new(Position::new(5.0, 5.0), 300.0, 10.0, direction)
    }

    #[test]
    fn test_sphere_mass_round_trip() {
        let mass = sphere_mass(1062.0, 1.0);
        assert!((mass - 4448.495).abs() < 1e-3);
        assert!((sphere_radius(1062.0, mass) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_flight_time() {
        let b = launch(PI / 4.0);
        assert_eq!(b.velocity, 15.0);
        let expected = 2.0 * 15.0 * (PI / 4.0).sin() / GRAVITY;
        assert!((b.flight_time() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_step_at_zero_is_origin() {
        let b = launch(PI / 3.0);
        assert_eq!(b.step(0.0).unwrap(), b.origin);
    }

    #[test]
    fn test_step_at_flight_time_is_endpoint() {
        let b = launch(PI / 3.0);
        let end = b.step(b.flight_time()).unwrap();
        assert_eq!(end, b.endpoint());
        // lands back at launch height
        assert!((end.y - 5.0).abs() < 1e-9);
        let expected_x = 5.0 + 15.0 * (PI / 3.0).cos() * b.flight_time();
        assert!((end.x - expected_x).abs() < 1e-9);
    }

    #[test]
    fn test_step_clamps_past_flight_time() {
        let b = launch(PI / 3.0);
        let t = b.flight_time();
        assert_eq!(b.step(t + 3.0).unwrap(), b.step(t).unwrap());
    }

    #[test]
    fn test_step_rejects_bad_time() {
        let b = launch(PI / 3.0);
        assert!(b.step(-0.1).unwrap_err().is_invalid_argument());
        assert!(b.step(f64::NAN).unwrap_err().is_invalid_argument());
        assert!(b.step(f64::INFINITY).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_downward_launch_stays_put() {
        let b = launch(3.0 * PI / 2.0);
        assert!(!b.can_fly());
        assert_eq!(b.step(0.5).unwrap(), b.origin);
        assert_eq!(b.endpoint(), b.origin);
    }

    #[test]
    fn test_position_at_is_unclamped() {
        let b = launch(PI / 4.0);
        let later = b.position_at(b.flight_time() * 2.0);
        assert!(later.y < b.origin.y);
    }

    #[test]
    fn test_time_to_sink_below() {
        let b = launch(PI / 2.0);
        let t = b.time_to_sink_below(0.0);
        assert!(b.position_at(t).y.abs() < 1e-9);
        assert!(t > b.flight_time());
        // already below the floor and falling
        assert_eq!(launch(3.0 * PI / 2.0).time_to_sink_below(10.0), 0.0);
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(1.0, 0.25).unwrap(), 5);
        assert_eq!(sample_count(0.0, 0.1).unwrap(), 1);
        assert!(sample_count(1.0, 0.0).unwrap_err().is_invalid_argument());
        assert!(sample_count(f64::NAN, 0.1).is_err());
        assert!(sample_count(-1.0, 0.1).is_err());
        // a one second flight sampled every picosecond
        assert!(sample_count(1.0, 1e-12).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_time_step_validation() {
        assert!(validate_time_step(0.01).is_ok());
        assert!(validate_time_step(0.0).is_err());
        assert!(validate_time_step(f64::NAN).is_err());
    }
}
