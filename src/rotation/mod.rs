//! Rotation model strategies
//!
//! A [`RotationModel`] supplies a body's spin state as a function of TDB
//! Julian date: the spin angle about the rotation axis, the orientation of
//! the equatorial plane, and the combined orientation. All orientations are
//! quaternions mapping coordinates of the surrounding frame into the rotated
//! coordinates; angular velocities are radians per day, expressed in the
//! surrounding frame's coordinates.

use crate::constants::TAU;
use nalgebra::{UnitQuaternion, Vector3};
use std::rc::Rc;

/// Step used when differentiating an orientation function, in days.
pub(crate) const ANGULAR_VELOCITY_DIFF_DELTA: f64 = 1.0 / 1440.0;

/// Angular velocity from a pair of orientations `h` days apart.
///
/// Both quaternions must map outer-frame coordinates into rotated
/// coordinates; the returned vector is expressed in outer-frame coordinates.
/// Orientation changes below the noise floor report zero rather than a
/// garbage axis.
pub(crate) fn angular_velocity_from_orientations(
    q0: UnitQuaternion<f64>,
    q1: UnitQuaternion<f64>,
    h: f64,
) -> Vector3<f64> {
    // Rotation carrying the frame axes from t to t+h, in outer coordinates.
    let dq = q1.conjugate() * q0;
    if dq.scalar().abs() > 0.999_999_99 {
        return Vector3::zeros();
    }
    let angle = 2.0 * dq.scalar().clamp(-1.0, 1.0).acos();
    dq.vector().normalize() * (angle / h)
}

/// Angular velocity of a time-varying orientation by differencing.
pub(crate) fn numeric_angular_velocity<F>(orientation: F, tdb: f64) -> Vector3<f64>
where
    F: Fn(f64) -> UnitQuaternion<f64>,
{
    let h = ANGULAR_VELOCITY_DIFF_DELTA;
    angular_velocity_from_orientations(orientation(tdb), orientation(tdb + h), h)
}

/// A spin-over-time strategy, shared immutably between timeline phases.
pub trait RotationModel {
    /// Rotation about the body's axis at `tdb`, relative to the equatorial
    /// plane. The body-fixed x axis lies along the prime meridian.
    fn spin(&self, tdb: f64) -> UnitQuaternion<f64>;

    /// Orientation of the equatorial plane relative to the surrounding frame.
    fn equator_orientation_at_time(&self, _tdb: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::identity()
    }

    /// Full orientation: spin applied on top of the equator orientation.
    fn orientation_at_time(&self, tdb: f64) -> UnitQuaternion<f64> {
        self.spin(tdb) * self.equator_orientation_at_time(tdb)
    }

    /// Angular velocity at `tdb` in radians per day, in the surrounding
    /// frame's coordinates. The default differentiates the orientation.
    fn angular_velocity_at_time(&self, tdb: f64) -> Vector3<f64> {
        numeric_angular_velocity(|t| self.orientation_at_time(t), tdb)
    }

    /// Rotation period in days, if the model is periodic.
    fn period(&self) -> Option<f64> {
        None
    }
}

/// Shared handle to a rotation model.
pub type RotationModelRef = Rc<dyn RotationModel>;

/// A constant orientation with zero angular velocity.
#[derive(Debug, Clone)]
pub struct FixedRotation {
    orientation: UnitQuaternion<f64>,
}

impl FixedRotation {
    pub fn new(orientation: UnitQuaternion<f64>) -> Self {
        FixedRotation { orientation }
    }

    /// Identity orientation; useful for barycenters and test fixtures.
    pub fn identity() -> Self {
        FixedRotation {
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl RotationModel for FixedRotation {
    fn spin(&self, _tdb: f64) -> UnitQuaternion<f64> {
        self.orientation
    }

    fn angular_velocity_at_time(&self, _tdb: f64) -> Vector3<f64> {
        Vector3::zeros()
    }
}

/// Constant-rate rotation about an axis tilted by inclination and node.
#[derive(Debug, Clone)]
pub struct UniformRotation {
    /// Sidereal rotation period in days
    period: f64,
    /// Angle of the prime meridian at `epoch`, radians
    meridian_angle: f64,
    /// Epoch at which the meridian angle applies
    epoch: f64,
    /// Tilt of the rotation axis from the frame's z axis, radians
    inclination: f64,
    /// Longitude of the ascending node of the equatorial plane, radians
    ascending_node: f64,
}

impl UniformRotation {
    pub fn new(
        period: f64,
        meridian_angle: f64,
        epoch: f64,
        inclination: f64,
        ascending_node: f64,
    ) -> Self {
        assert!(period > 0.0, "uniform rotation requires a positive period");
        UniformRotation {
            period,
            meridian_angle,
            epoch,
            inclination,
            ascending_node,
        }
    }

    /// Untilted rotation about the frame's z axis.
    pub fn simple(period: f64, meridian_angle: f64, epoch: f64) -> Self {
        Self::new(period, meridian_angle, epoch, 0.0, 0.0)
    }

    fn spin_angle(&self, tdb: f64) -> f64 {
        self.meridian_angle + TAU * (tdb - self.epoch) / self.period
    }
}

impl RotationModel for UniformRotation {
    fn spin(&self, tdb: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -self.spin_angle(tdb))
    }

    fn equator_orientation_at_time(&self, _tdb: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -self.inclination)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -self.ascending_node)
    }

    fn angular_velocity_at_time(&self, tdb: f64) -> Vector3<f64> {
        let axis = self.equator_orientation_at_time(tdb).inverse() * Vector3::z();
        axis * (TAU / self.period)
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_rotation_is_static() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.4);
        let model = FixedRotation::new(q);
        assert_eq!(model.orientation_at_time(0.0), model.orientation_at_time(99.0));
        assert_eq!(model.angular_velocity_at_time(12.0), Vector3::zeros());
    }

    #[test]
    fn test_uniform_rotation_rate() {
        let model = UniformRotation::new(1.0, 0.0, 2451545.0, 0.0, 0.0);
        let w = model.angular_velocity_at_time(2451545.0);
        assert_relative_eq!(w.norm(), TAU, epsilon = 1e-12);
        assert_relative_eq!(w.z, TAU, epsilon = 1e-12);
    }

    #[test]
    fn test_analytic_matches_numeric_angular_velocity() {
        let model = UniformRotation::new(0.9972, 1.1, 2451545.0, 0.41, 0.7);
        for i in 0..8 {
            let t = 2451545.0 + i as f64 * 0.37;
            let analytic = model.angular_velocity_at_time(t);
            let numeric = numeric_angular_velocity(|t| model.orientation_at_time(t), t);
            assert_relative_eq!(analytic.x, numeric.x, epsilon = 1e-6, max_relative = 1e-4);
            assert_relative_eq!(analytic.y, numeric.y, epsilon = 1e-6, max_relative = 1e-4);
            assert_relative_eq!(analytic.z, numeric.z, epsilon = 1e-6, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_spin_advances_with_time() {
        let model = UniformRotation::new(2.0, 0.0, 0.0, 0.0, 0.0);
        let p = Vector3::x();
        // After half a period the meridian-fixed direction has swept pi.
        let swept = model.spin(1.0).inverse() * (model.spin(0.0) * p);
        assert_relative_eq!(swept.x, -1.0, epsilon = 1e-12);
    }
}
