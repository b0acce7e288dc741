//! Tagged references to frame-center entities
//!
//! A [`Selection`] names whichever entity a reference frame uses as its
//! center: a body, a star, or a barycenter. Selections never own their
//! referent; they hold `Weak` handles, and a referent that has been dropped
//! out from under a live frame graph surfaces as a
//! [`DanglingReference`](crate::OrreryError::DanglingReference) error during
//! resolution rather than a panic.

use crate::body::{Body, BodyRef};
use crate::coords::UniversalCoord;
use crate::ensure_depth;
use crate::orbits::OrbitRef;
use crate::{OrreryError, Result};
use nalgebra::{UnitQuaternion, Vector3};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type StarRef = Rc<RefCell<Star>>;
pub type BarycenterRef = Rc<RefCell<Barycenter>>;

/// How a star or barycenter is placed in the universe: pinned at an absolute
/// coordinate, or orbiting another selection (barycenters orbit barycenters).
#[derive(Clone)]
pub enum Anchor {
    Fixed(UniversalCoord),
    Orbiting { center: Selection, orbit: OrbitRef },
}

impl Anchor {
    fn position(&self, tdb: f64, depth: usize) -> Result<UniversalCoord> {
        ensure_depth(depth)?;
        match self {
            Anchor::Fixed(coord) => Ok(*coord),
            Anchor::Orbiting { center, orbit } => Ok(center
                .position_at_depth(tdb, depth + 1)?
                .offset_km(orbit.position_at_time(tdb))),
        }
    }

    fn velocity(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        ensure_depth(depth)?;
        match self {
            Anchor::Fixed(_) => Ok(Vector3::zeros()),
            Anchor::Orbiting { center, orbit } => {
                Ok(center.velocity_at_depth(tdb, depth + 1)? + orbit.velocity_at_time(tdb))
            }
        }
    }
}

/// A star: terminal anchor of a frame-center chain, with the physical
/// attributes body photometry and temperature estimates need.
pub struct Star {
    name: String,
    /// Radius in kilometers
    radius: f64,
    /// Effective surface temperature in Kelvin
    temperature: f64,
    /// Luminosity in solar units
    luminosity: f64,
    anchor: Anchor,
}

impl Star {
    pub fn new(name: impl Into<String>, radius: f64, temperature: f64, luminosity: f64) -> Self {
        Star {
            name: name.into(),
            radius,
            temperature,
            luminosity,
            anchor: Anchor::Fixed(UniversalCoord::origin()),
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn into_ref(self) -> StarRef {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn luminosity(&self) -> f64 {
        self.luminosity
    }

    pub fn get_position(&self, tdb: f64) -> Result<UniversalCoord> {
        self.position_at_depth(tdb, 0)
    }

    pub fn get_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.velocity_at_depth(tdb, 0)
    }

    pub(crate) fn position_at_depth(&self, tdb: f64, depth: usize) -> Result<UniversalCoord> {
        self.anchor.position(tdb, depth)
    }

    pub(crate) fn velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        self.anchor.velocity(tdb, depth)
    }
}

/// A massless reference point used as an orbit center.
pub struct Barycenter {
    name: String,
    anchor: Anchor,
}

impl Barycenter {
    pub fn new(name: impl Into<String>) -> Self {
        Barycenter {
            name: name.into(),
            anchor: Anchor::Fixed(UniversalCoord::origin()),
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn into_ref(self) -> BarycenterRef {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_position(&self, tdb: f64) -> Result<UniversalCoord> {
        self.position_at_depth(tdb, 0)
    }

    pub fn get_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.velocity_at_depth(tdb, 0)
    }

    pub(crate) fn position_at_depth(&self, tdb: f64, depth: usize) -> Result<UniversalCoord> {
        self.anchor.position(tdb, depth)
    }

    pub(crate) fn velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        self.anchor.velocity(tdb, depth)
    }
}

/// Non-owning tagged reference to a frame-center entity.
#[derive(Clone, Default)]
pub enum Selection {
    #[default]
    None,
    Body(Weak<RefCell<Body>>),
    Star(Weak<RefCell<Star>>),
    Barycenter(Weak<RefCell<Barycenter>>),
}

impl Selection {
    pub fn from_body(body: &BodyRef) -> Self {
        Selection::Body(Rc::downgrade(body))
    }

    pub fn from_star(star: &StarRef) -> Self {
        Selection::Star(Rc::downgrade(star))
    }

    pub fn from_barycenter(barycenter: &BarycenterRef) -> Self {
        Selection::Barycenter(Rc::downgrade(barycenter))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::None)
    }

    /// The referenced body, if this selection is a live body reference.
    pub fn body(&self) -> Option<BodyRef> {
        match self {
            Selection::Body(weak) => weak.upgrade(),
            _ => None,
        }
    }

    pub fn star(&self) -> Option<StarRef> {
        match self {
            Selection::Star(weak) => weak.upgrade(),
            _ => None,
        }
    }

    pub fn barycenter(&self) -> Option<BarycenterRef> {
        match self {
            Selection::Barycenter(weak) => weak.upgrade(),
            _ => None,
        }
    }

    /// Name of the referent, for diagnostics. Dangling references report as
    /// such rather than erroring.
    pub fn name(&self) -> String {
        match self {
            Selection::None => "<empty>".to_string(),
            Selection::Body(weak) => match weak.upgrade() {
                Some(body) => body.borrow().get_name(false),
                None => "<dangling body>".to_string(),
            },
            Selection::Star(weak) => match weak.upgrade() {
                Some(star) => star.borrow().name().to_string(),
                None => "<dangling star>".to_string(),
            },
            Selection::Barycenter(weak) => match weak.upgrade() {
                Some(bc) => bc.borrow().name().to_string(),
                None => "<dangling barycenter>".to_string(),
            },
        }
    }

    /// For frame-center walks: the center body if this is a body selection,
    /// `None` for the terminal (star/barycenter/empty) cases, and an error
    /// for a body reference whose referent has been dropped.
    pub(crate) fn resolve_body(&self) -> Result<Option<BodyRef>> {
        match self {
            Selection::Body(weak) => weak
                .upgrade()
                .map(Some)
                .ok_or_else(|| OrreryError::DanglingReference("frame center body".into())),
            _ => Ok(None),
        }
    }

    /// Position of the referent in the universal frame.
    pub fn get_position(&self, tdb: f64) -> Result<UniversalCoord> {
        self.position_at_depth(tdb, 0)
    }

    /// Velocity of the referent in km/day, universal frame.
    pub fn get_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.velocity_at_depth(tdb, 0)
    }

    /// Orientation of the referent; identity for anything but a body.
    pub fn get_orientation(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        match self.body() {
            Some(body) => body.borrow().get_orientation(tdb),
            None => Ok(UnitQuaternion::identity()),
        }
    }

    /// Angular velocity of the referent; zero for anything but a body.
    pub fn get_angular_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        match self.body() {
            Some(body) => body.borrow().get_angular_velocity(tdb),
            None => Ok(Vector3::zeros()),
        }
    }

    pub(crate) fn position_at_depth(&self, tdb: f64, depth: usize) -> Result<UniversalCoord> {
        ensure_depth(depth)?;
        match self {
            Selection::None => Ok(UniversalCoord::origin()),
            Selection::Body(weak) => match weak.upgrade() {
                Some(body) => body.borrow().position_at_depth(tdb, depth),
                None => Err(OrreryError::DanglingReference("body".into())),
            },
            Selection::Star(weak) => match weak.upgrade() {
                Some(star) => star.borrow().position_at_depth(tdb, depth),
                None => Err(OrreryError::DanglingReference("star".into())),
            },
            Selection::Barycenter(weak) => match weak.upgrade() {
                Some(bc) => bc.borrow().position_at_depth(tdb, depth),
                None => Err(OrreryError::DanglingReference("barycenter".into())),
            },
        }
    }

    pub(crate) fn velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        ensure_depth(depth)?;
        match self {
            Selection::None => Ok(Vector3::zeros()),
            Selection::Body(weak) => match weak.upgrade() {
                Some(body) => body.borrow().velocity_at_depth(tdb, depth),
                None => Err(OrreryError::DanglingReference("body".into())),
            },
            Selection::Star(weak) => match weak.upgrade() {
                Some(star) => star.borrow().velocity_at_depth(tdb, depth),
                None => Err(OrreryError::DanglingReference("star".into())),
            },
            Selection::Barycenter(weak) => match weak.upgrade() {
                Some(bc) => bc.borrow().velocity_at_depth(tdb, depth),
                None => Err(OrreryError::DanglingReference("barycenter".into())),
            },
        }
    }
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::None => write!(f, "Selection::None"),
            Selection::Body(_) => write!(f, "Selection::Body({})", self.name()),
            Selection::Star(_) => write!(f, "Selection::Star({})", self.name()),
            Selection::Barycenter(_) => write!(f, "Selection::Barycenter({})", self.name()),
        }
    }
}
