//! Reference frames
//!
//! A [`ReferenceFrame`] supplies a time-varying orientation relative to the
//! universal (J2000 ecliptic) frame, an angular velocity, and a center
//! [`Selection`]. Orientation quaternions map universal coordinates into
//! frame coordinates; `orientation(tdb)?.conjugate() * v` takes a
//! frame-local vector back out.
//!
//! A frame resolves its own rotational ancestry internally: a body-fixed
//! frame of a moon whose frame is itself tilted reports the fully composed
//! orientation. Like the positional center walks, this resolution threads a
//! recursion depth, so a frame graph that closes a loop reports
//! [`FrameDepthExceeded`](crate::OrreryError::FrameDepthExceeded) instead of
//! overflowing the stack. Translational ancestry is not a frame concern:
//! composing per-body orbit offsets is done by the position resolution walk
//! in [`crate::body`].

use crate::constants::{DEG2RAD, J2000_OBLIQUITY_DEG};
use crate::ensure_depth;
use crate::rotation::{angular_velocity_from_orientations, ANGULAR_VELOCITY_DIFF_DELTA};
use crate::selection::Selection;
use crate::Result;
use nalgebra::{UnitQuaternion, Vector3};
use once_cell::sync::Lazy;
use std::rc::Rc;

/// Rotation from the ecliptic frame to the J2000 equatorial frame.
static ECLIPTIC_TO_EQUATORIAL: Lazy<UnitQuaternion<f64>> = Lazy::new(|| {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), J2000_OBLIQUITY_DEG * DEG2RAD)
});

/// A time-varying orientation with a center, shared immutably between
/// timeline phases and bodies.
pub trait ReferenceFrame {
    /// This frame's axes relative to the universal frame at `tdb`, with the
    /// frame's own parent chain already composed. `depth` counts resolution
    /// hops already taken; exceeding [`crate::MAX_FRAME_DEPTH`] means the
    /// frame graph is cyclic.
    fn orientation_at_depth(&self, tdb: f64, depth: usize) -> Result<UnitQuaternion<f64>>;

    /// [`Self::orientation_at_depth`] from the top of a fresh chain.
    fn orientation(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        self.orientation_at_depth(tdb, 0)
    }

    /// Angular velocity of the frame in radians per day, universal
    /// coordinates. The default differentiates the orientation; inertial
    /// frames and frames with an analytic rate should override it.
    fn angular_velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        let h = ANGULAR_VELOCITY_DIFF_DELTA;
        let q0 = self.orientation_at_depth(tdb, depth)?;
        let q1 = self.orientation_at_depth(tdb + h, depth)?;
        Ok(angular_velocity_from_orientations(q0, q1, h))
    }

    /// [`Self::angular_velocity_at_depth`] from the top of a fresh chain.
    fn angular_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.angular_velocity_at_depth(tdb, 0)
    }

    /// The entity at this frame's origin.
    fn center(&self) -> Selection;

    /// True if the frame has zero angular velocity relative to the universal
    /// frame. Non-inertial frames require velocity correction terms.
    fn is_inertial(&self) -> bool;

    /// Convert a frame-local position to astrocentric ecliptic coordinates:
    /// the rotated offset plus the center's own astrocentric position.
    fn convert_to_astrocentric(&self, local: &Vector3<f64>, tdb: f64) -> Result<Vector3<f64>> {
        astrocentric_from(self.orientation(tdb)?, &self.center(), local, tdb, 0)
    }
}

/// Shared handle to a reference frame.
pub type FrameRef = Rc<dyn ReferenceFrame>;

/// Depth-guarded worker behind
/// [`ReferenceFrame::convert_to_astrocentric`]; also used by the body
/// resolution code, which threads its own recursion depth.
pub(crate) fn astrocentric_from(
    orientation: UnitQuaternion<f64>,
    center: &Selection,
    local: &Vector3<f64>,
    tdb: f64,
    depth: usize,
) -> Result<Vector3<f64>> {
    ensure_depth(depth)?;
    let rotated = orientation.conjugate() * local;
    match center.resolve_body()? {
        Some(body) => {
            let center = body.borrow().astrocentric_at_depth(tdb, depth + 1)?;
            Ok(center + rotated)
        }
        None => Ok(rotated),
    }
}

/// The universal frame itself: J2000 ecliptic axes, inertial.
pub struct EclipticJ2000 {
    center: Selection,
}

impl EclipticJ2000 {
    pub fn new(center: Selection) -> Self {
        EclipticJ2000 { center }
    }

    pub fn shared(center: Selection) -> FrameRef {
        Rc::new(Self::new(center))
    }
}

impl ReferenceFrame for EclipticJ2000 {
    fn orientation_at_depth(&self, _tdb: f64, _depth: usize) -> Result<UnitQuaternion<f64>> {
        Ok(UnitQuaternion::identity())
    }

    fn angular_velocity_at_depth(&self, _tdb: f64, _depth: usize) -> Result<Vector3<f64>> {
        Ok(Vector3::zeros())
    }

    fn center(&self) -> Selection {
        self.center.clone()
    }

    fn is_inertial(&self) -> bool {
        true
    }
}

/// Earth mean equator of J2000: the ecliptic frame tilted by the obliquity.
pub struct EquatorJ2000 {
    center: Selection,
}

impl EquatorJ2000 {
    pub fn new(center: Selection) -> Self {
        EquatorJ2000 { center }
    }

    pub fn shared(center: Selection) -> FrameRef {
        Rc::new(Self::new(center))
    }
}

impl ReferenceFrame for EquatorJ2000 {
    fn orientation_at_depth(&self, _tdb: f64, _depth: usize) -> Result<UnitQuaternion<f64>> {
        Ok(*ECLIPTIC_TO_EQUATORIAL)
    }

    fn angular_velocity_at_depth(&self, _tdb: f64, _depth: usize) -> Result<Vector3<f64>> {
        Ok(Vector3::zeros())
    }

    fn center(&self) -> Selection {
        self.center.clone()
    }

    fn is_inertial(&self) -> bool {
        true
    }
}

/// A frame that rotates with a target object's body-fixed axes.
///
/// Non-inertial: satellites defined in this frame co-rotate with the target,
/// and velocity resolution adds the `w x r` term.
pub struct BodyFixedFrame {
    center: Selection,
    target: Selection,
}

impl BodyFixedFrame {
    /// A body-fixed frame centered on and rotating with the same object.
    pub fn new(target: Selection) -> Self {
        BodyFixedFrame {
            center: target.clone(),
            target,
        }
    }

    pub fn shared(target: Selection) -> FrameRef {
        Rc::new(Self::new(target))
    }
}

impl ReferenceFrame for BodyFixedFrame {
    fn orientation_at_depth(&self, tdb: f64, depth: usize) -> Result<UnitQuaternion<f64>> {
        ensure_depth(depth)?;
        match self.target.body() {
            Some(body) => {
                let body = body.borrow();
                body.ecliptic_to_body_fixed_at_depth(tdb, depth + 1)
            }
            None => {
                log::warn!("body-fixed frame target {} unavailable", self.target.name());
                Ok(UnitQuaternion::identity())
            }
        }
    }

    fn angular_velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        ensure_depth(depth)?;
        match self.target.body() {
            Some(body) => {
                let body = body.borrow();
                body.angular_velocity_at_depth(tdb, depth + 1)
            }
            None => {
                log::warn!("body-fixed frame target {} unavailable", self.target.name());
                Ok(Vector3::zeros())
            }
        }
    }

    fn center(&self) -> Selection {
        self.center.clone()
    }

    fn is_inertial(&self) -> bool {
        false
    }
}

/// A frame aligned with a target object's mean equatorial plane.
///
/// Unlike [`BodyFixedFrame`] it does not spin with the target's meridian,
/// but the equator of a precessing object still moves, so the frame is
/// treated as non-inertial and its rate obtained numerically.
pub struct BodyMeanEquatorFrame {
    center: Selection,
    target: Selection,
}

impl BodyMeanEquatorFrame {
    pub fn new(center: Selection, target: Selection) -> Self {
        BodyMeanEquatorFrame { center, target }
    }

    pub fn shared(center: Selection, target: Selection) -> FrameRef {
        Rc::new(Self::new(center, target))
    }
}

impl ReferenceFrame for BodyMeanEquatorFrame {
    fn orientation_at_depth(&self, tdb: f64, depth: usize) -> Result<UnitQuaternion<f64>> {
        ensure_depth(depth)?;
        match self.target.body() {
            Some(body) => {
                let body = body.borrow();
                body.ecliptic_to_equatorial_at_depth(tdb, depth + 1)
            }
            None => {
                log::warn!("mean-equator frame target {} unavailable", self.target.name());
                Ok(UnitQuaternion::identity())
            }
        }
    }

    fn center(&self) -> Selection {
        self.center.clone()
    }

    fn is_inertial(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ecliptic_frame_is_identity() {
        let frame = EclipticJ2000::new(Selection::None);
        assert_eq!(frame.orientation(0.0).unwrap(), UnitQuaternion::identity());
        assert!(frame.is_inertial());
        assert_eq!(frame.angular_velocity(0.0).unwrap(), Vector3::zeros());
    }

    #[test]
    fn test_equatorial_tilt() {
        let frame = EquatorJ2000::new(Selection::None);
        let q = frame.orientation(0.0).unwrap();
        // The ecliptic pole maps away from the equatorial pole by the
        // obliquity.
        let pole = q * Vector3::z();
        let angle = pole.dot(&Vector3::z()).acos();
        assert_relative_eq!(angle, J2000_OBLIQUITY_DEG * DEG2RAD, epsilon = 1e-12);
    }

    #[test]
    fn test_astrocentric_conversion_without_body_center() {
        let frame = EquatorJ2000::new(Selection::None);
        let local = Vector3::new(0.0, 1.0, 0.0);
        let out = frame.convert_to_astrocentric(&local, 0.0).unwrap();
        // Rotating out of the equatorial frame tips y out of the ecliptic
        // plane by the obliquity.
        assert_relative_eq!(out.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(out.z.abs(), (J2000_OBLIQUITY_DEG * DEG2RAD).sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_dangling_target_degrades_to_identity() {
        let frame = BodyFixedFrame::new(Selection::None);
        assert_eq!(frame.orientation(0.0).unwrap(), UnitQuaternion::identity());
        assert_eq!(frame.angular_velocity(0.0).unwrap(), Vector3::zeros());
    }

    #[test]
    fn test_orientation_rejects_runaway_depth() {
        let frame = BodyFixedFrame::new(Selection::None);
        assert!(frame
            .orientation_at_depth(0.0, crate::MAX_FRAME_DEPTH + 1)
            .is_err());
    }
}
