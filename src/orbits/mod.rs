//! Orbit strategies
//!
//! An [`Orbit`] supplies a body's position (and optionally an analytic
//! velocity) as a function of TDB Julian date, expressed in kilometers local
//! to the owning reference frame. The trait is the seam for plugging in real
//! ephemerides; the implementations here are the simple analytic ones the
//! rest of the crate needs for scene fixtures and tests.
//!
//! Velocities are kilometers per day, matching the day-valued time parameter.

use crate::constants::TAU;
use nalgebra::Vector3;
use std::rc::Rc;

/// Step used by the default finite-difference velocity, in days.
const VELOCITY_DIFF_DELTA: f64 = 1.0 / 1440.0;

/// A position-over-time strategy, shared immutably between timeline phases.
pub trait Orbit {
    /// Position at `tdb` in kilometers, local to the owning frame.
    fn position_at_time(&self, tdb: f64) -> Vector3<f64>;

    /// Velocity at `tdb` in kilometers per day.
    ///
    /// The default central-differences the position; implementations with an
    /// analytic derivative should override it.
    fn velocity_at_time(&self, tdb: f64) -> Vector3<f64> {
        let h = VELOCITY_DIFF_DELTA;
        (self.position_at_time(tdb + h) - self.position_at_time(tdb - h)) / (2.0 * h)
    }

    /// Orbital period in days, if the trajectory is periodic.
    fn period(&self) -> Option<f64> {
        None
    }

    /// Radius of a sphere (km) guaranteed to contain the trajectory.
    fn bounding_radius(&self) -> f64;
}

/// Shared handle to an orbit strategy.
pub type OrbitRef = Rc<dyn Orbit>;

/// A body pinned at a constant offset from its frame center.
#[derive(Debug, Clone)]
pub struct FixedPoint {
    position: Vector3<f64>,
}

impl FixedPoint {
    pub fn new(position: Vector3<f64>) -> Self {
        FixedPoint { position }
    }
}

impl Orbit for FixedPoint {
    fn position_at_time(&self, _tdb: f64) -> Vector3<f64> {
        self.position
    }

    fn velocity_at_time(&self, _tdb: f64) -> Vector3<f64> {
        Vector3::zeros()
    }

    fn bounding_radius(&self) -> f64 {
        self.position.norm()
    }
}

/// Uniform circular motion in the frame's xy plane.
#[derive(Debug, Clone)]
pub struct CircularOrbit {
    /// Orbit radius in kilometers
    radius: f64,
    /// Period in days
    period: f64,
    /// Epoch at which the phase angle equals `phase0`
    epoch: f64,
    /// Phase angle at `epoch`, radians
    phase0: f64,
}

impl CircularOrbit {
    pub fn new(radius: f64, period: f64, epoch: f64, phase0: f64) -> Self {
        assert!(period > 0.0, "circular orbit requires a positive period");
        CircularOrbit {
            radius,
            period,
            epoch,
            phase0,
        }
    }

    fn phase_angle(&self, tdb: f64) -> f64 {
        self.phase0 + TAU * (tdb - self.epoch) / self.period
    }
}

impl Orbit for CircularOrbit {
    fn position_at_time(&self, tdb: f64) -> Vector3<f64> {
        let theta = self.phase_angle(tdb);
        Vector3::new(self.radius * theta.cos(), self.radius * theta.sin(), 0.0)
    }

    fn velocity_at_time(&self, tdb: f64) -> Vector3<f64> {
        let theta = self.phase_angle(tdb);
        let rate = TAU / self.period * self.radius;
        Vector3::new(-rate * theta.sin(), rate * theta.cos(), 0.0)
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }

    fn bounding_radius(&self) -> f64 {
        self.radius
    }
}
