//! Bodies and the state resolution algorithms
//!
//! A [`Body`] is anything that orbits: planet, moon, asteroid, comet,
//! spacecraft, or an invisible reference point. It owns exactly one
//! [`Timeline`], optionally a [`FrameTree`] (iff it has satellites), and
//! optionally a child [`PlanetarySystem`] of satellites. The four resolution
//! queries (position, orientation, velocity, angular velocity) walk the
//! timeline and frame structures for a caller-supplied TDB instant and
//! return state in the universal frame.
//!
//! Positions use a two-tier precision scheme: offsets within a system are
//! accumulated in plain double precision, and only the final step offsets
//! the terminal star's or barycenter's high-precision [`UniversalCoord`].
//! See [`crate::coords`] for why.

use crate::constants::{au_to_km, circle_area, km_to_ly, lum_to_app_mag, sphere_area, SOLAR_POWER_W};
use crate::coords::UniversalCoord;
use crate::ensure_depth;
use crate::frames::astrocentric_from;
use crate::frametree::FrameTree;
use crate::system::SystemRef;
use crate::timeline::Timeline;
use crate::{OrreryError, Result};
use nalgebra::{Matrix4, Translation3, UnitQuaternion, Vector3};
use std::cell::RefCell;
use std::ops::BitOr;
use std::rc::{Rc, Weak};

pub type BodyRef = Rc<RefCell<Body>>;

/// Classification tag for a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyClassification {
    Planet,
    DwarfPlanet,
    Moon,
    MinorMoon,
    Asteroid,
    Comet,
    Spacecraft,
    Invisible,
    #[default]
    Unknown,
}

impl BodyClassification {
    /// Bit value for classification masks.
    pub fn bit(self) -> u32 {
        match self {
            BodyClassification::Planet => 0x0001,
            BodyClassification::Moon => 0x0002,
            BodyClassification::Asteroid => 0x0004,
            BodyClassification::Comet => 0x0008,
            BodyClassification::Spacecraft => 0x0010,
            BodyClassification::Invisible => 0x0020,
            BodyClassification::DwarfPlanet => 0x0040,
            BodyClassification::MinorMoon => 0x0080,
            BodyClassification::Unknown => 0x1000,
        }
    }

    pub fn mask(self) -> ClassificationMask {
        ClassificationMask(self.bit())
    }

    /// Priority order for deriving an invisible body's effective orbit
    /// classification from its children. First class present wins.
    pub(crate) const ORBIT_PRIORITY: [BodyClassification; 6] = [
        BodyClassification::Planet,
        BodyClassification::DwarfPlanet,
        BodyClassification::Asteroid,
        BodyClassification::Moon,
        BodyClassification::MinorMoon,
        BodyClassification::Spacecraft,
    ];
}

/// Union of classification bits over a set of bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassificationMask(u32);

impl ClassificationMask {
    pub fn empty() -> Self {
        ClassificationMask(0)
    }

    pub fn contains(self, class: BodyClassification) -> bool {
        self.0 & class.bit() != 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for ClassificationMask {
    type Output = ClassificationMask;

    fn bitor(self, rhs: Self) -> Self {
        ClassificationMask(self.0 | rhs.0)
    }
}

/// Atmosphere shell parameters relevant to culling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Atmosphere {
    /// Height of the atmosphere shell above the surface, km
    pub height: f64,
    /// Height of the cloud layer above the surface, km
    pub cloud_height: f64,
}

/// Ring system extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSystem {
    /// Inner edge radius, km
    pub inner_radius: f64,
    /// Outer edge radius, km
    pub outer_radius: f64,
}

/// An annotation attached to a body (axes, velocity vector, grid...) that
/// contributes to the body's culling sphere.
pub trait ReferenceMark {
    /// Tag identifying the mark; unique per body by convention.
    fn tag(&self) -> &str;

    /// Radius of a sphere containing the rendered mark, km.
    fn bounding_sphere_radius(&self) -> f64;
}

/// Minimal reference mark: a tag and a fixed bounding radius.
pub struct SphereMark {
    tag: String,
    radius: f64,
}

impl SphereMark {
    pub fn new(tag: impl Into<String>, radius: f64) -> Self {
        SphereMark {
            tag: tag.into(),
            radius,
        }
    }
}

impl ReferenceMark for SphereMark {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn bounding_sphere_radius(&self) -> f64 {
        self.radius
    }
}

pub struct Body {
    /// All names for this body; `names[0]` is the primary name.
    names: Vec<String>,
    localized_name: Option<String>,
    system: Weak<RefCell<crate::system::PlanetarySystem>>,
    timeline: Option<Timeline>,
    frame_tree: Option<Rc<FrameTree>>,
    satellites: Option<SystemRef>,

    /// Largest semi-axis, km
    radius: f64,
    semi_axes: Vector3<f64>,
    /// Mass in kilograms
    mass: f64,
    /// Explicit density in kg/m^3; 0 means "derive from mass and radius"
    density: f64,
    geom_albedo: f64,
    bond_albedo: f64,
    reflectivity: f64,
    /// Explicit temperature in K; 0 means "estimate from the primary star"
    temperature: f64,
    temp_discrepancy: f64,
    classification: BodyClassification,
    /// Opaque handle to an irregular (mesh) geometry resource, if any.
    /// Bodies without one are ellipsoids defined by their semi-axes.
    geometry: Option<String>,
    atmosphere: Option<Atmosphere>,
    rings: Option<RingSystem>,
    reference_marks: Vec<Box<dyn ReferenceMark>>,
    culling_radius: f64,

    visible: bool,
    clickable: bool,
    visible_as_point: bool,
    secondary_illuminator: bool,
}

impl Body {
    /// Create a detached body with default attributes. Attach it to a parent
    /// system with [`crate::system::PlanetarySystem::add_body`] and give it a
    /// timeline with [`Body::set_timeline`] before querying state.
    pub fn new(name: impl Into<String>) -> BodyRef {
        let mut body = Body {
            names: vec![name.into()],
            localized_name: None,
            system: Weak::new(),
            timeline: None,
            frame_tree: None,
            satellites: None,
            radius: 1.0,
            semi_axes: Vector3::new(1.0, 1.0, 1.0),
            mass: 0.0,
            density: 0.0,
            geom_albedo: 0.5,
            bond_albedo: 0.5,
            reflectivity: 0.5,
            temperature: 0.0,
            temp_discrepancy: 0.0,
            classification: BodyClassification::Unknown,
            geometry: None,
            atmosphere: None,
            rings: None,
            reference_marks: Vec::new(),
            culling_radius: 0.0,
            visible: true,
            clickable: true,
            visible_as_point: true,
            secondary_illuminator: false,
        };
        body.recompute_culling_radius();
        Rc::new(RefCell::new(body))
    }

    // --- names ---------------------------------------------------------

    /// All names (non-localized) by which this body is known.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Primary name; the localized one if `i18n` and a localization exists.
    pub fn get_name(&self, i18n: bool) -> String {
        if i18n {
            if let Some(localized) = &self.localized_name {
                return localized.clone();
            }
        }
        self.names[0].clone()
    }

    pub fn get_localized_name(&self) -> String {
        self.localized_name
            .clone()
            .unwrap_or_else(|| self.names[0].clone())
    }

    pub fn has_localized_name(&self) -> bool {
        self.localized_name.is_some()
    }

    pub fn set_localized_name(&mut self, name: impl Into<String>) {
        self.localized_name = Some(name.into());
    }

    /// Add an alias (non-localized). Updates the parent system's name index.
    pub fn add_alias(this: &BodyRef, alias: impl Into<String>) {
        let alias = alias.into();
        let system = {
            let mut body = this.borrow_mut();
            if alias == body.names[0] {
                return;
            }
            body.names.push(alias.clone());
            body.system.upgrade()
        };
        if let Some(system) = system {
            system.borrow_mut().add_alias(this, &alias);
        }
    }

    // --- hierarchy -----------------------------------------------------

    pub fn system(&self) -> Option<SystemRef> {
        self.system.upgrade()
    }

    pub(crate) fn attach_to_system(&mut self, system: &SystemRef) {
        self.system = Rc::downgrade(system);
    }

    pub fn frame_tree(&self) -> Option<Rc<FrameTree>> {
        self.frame_tree.clone()
    }

    pub fn get_or_create_frame_tree(this: &BodyRef) -> Rc<FrameTree> {
        let mut body = this.borrow_mut();
        if let Some(tree) = &body.frame_tree {
            return tree.clone();
        }
        let tree = Rc::new(FrameTree::new(Rc::downgrade(this)));
        body.frame_tree = Some(tree.clone());
        tree
    }

    pub fn get_satellites(&self) -> Option<SystemRef> {
        self.satellites.clone()
    }

    pub fn set_satellites(&mut self, satellites: SystemRef) {
        self.satellites = Some(satellites);
    }

    // --- timeline ------------------------------------------------------

    pub fn get_timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Replace the timeline wholesale (e.g. a scripted orbit change) and
    /// propagate the change signal so derived caches invalidate.
    pub fn set_timeline(&mut self, timeline: Timeline) {
        log::debug!("body {} timeline replaced", self.names[0]);
        self.timeline = Some(timeline);
        self.mark_changed();
    }

    fn timeline(&self) -> Result<&Timeline> {
        self.timeline
            .as_ref()
            .ok_or_else(|| OrreryError::MissingTimeline(self.names[0].clone()))
    }

    /// True if the body exists at `tdb`. Resolution queries outside the
    /// lifespan still succeed (clamped); this is the existence check.
    pub fn extant(&self, tdb: f64) -> bool {
        self.timeline.as_ref().is_some_and(|t| t.includes(tdb))
    }

    /// Start and end of the body's existence, if it has a timeline.
    pub fn get_lifespan(&self) -> Option<(f64, f64)> {
        self.timeline
            .as_ref()
            .map(|t| (t.start_time(), t.end_time()))
    }

    // --- change propagation --------------------------------------------

    /// Notify that this body's trajectory or attributes changed: flags the
    /// timeline dirty and climbs the frame hierarchy. Pure notification; the
    /// recomputation happens when a consumer next queries.
    pub fn mark_changed(&self) {
        if let Some(timeline) = &self.timeline {
            timeline.mark_changed();
        }
        if let Some(tree) = self.parent_frame_tree() {
            tree.mark_updated();
        }
    }

    /// Flag this body's own subtree as updated.
    pub fn mark_updated(&self) {
        if let Some(tree) = &self.frame_tree {
            tree.mark_updated();
        }
    }

    fn parent_frame_tree(&self) -> Option<Rc<FrameTree>> {
        let system = self.system.upgrade()?;
        let primary = system.try_borrow().ok()?.primary()?;
        let tree = primary.try_borrow().ok()?.frame_tree();
        tree
    }

    // --- state resolution ----------------------------------------------

    /// Position in the universal frame.
    ///
    /// Walks the orbit-frame center chain, accumulating a double-precision
    /// offset until the center resolves to a star or barycenter, whose own
    /// high-precision position is then offset by the accumulated vector.
    pub fn get_position(&self, tdb: f64) -> Result<UniversalCoord> {
        self.position_at_depth(tdb, 0)
    }

    pub(crate) fn position_at_depth(&self, tdb: f64, depth: usize) -> Result<UniversalCoord> {
        ensure_depth(depth)?;
        let phase = self.timeline()?.find_phase(tdb);
        let mut local = phase.orbit().position_at_time(tdb);
        let mut frame = phase.orbit_frame().clone();
        let mut offset = Vector3::zeros();
        let mut depth = depth;

        loop {
            let center = frame.center();
            offset += frame.orientation_at_depth(tdb, depth)?.conjugate() * local;
            match center.resolve_body()? {
                Some(parent) => {
                    depth += 1;
                    ensure_depth(depth)?;
                    let parent = parent.borrow();
                    let parent_phase = parent.timeline()?.find_phase(tdb);
                    local = parent_phase.orbit().position_at_time(tdb);
                    frame = parent_phase.orbit_frame().clone();
                }
                None => {
                    return Ok(center.position_at_depth(tdb, depth + 1)?.offset_km(offset));
                }
            }
        }
    }

    /// Orientation in the universal frame: the spin state composed with the
    /// body frame, whose own rotational ancestry the frame resolves
    /// internally.
    pub fn get_orientation(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        self.orientation_at_depth(tdb, 0)
    }

    pub(crate) fn orientation_at_depth(&self, tdb: f64, depth: usize) -> Result<UnitQuaternion<f64>> {
        ensure_depth(depth)?;
        let phase = self.timeline()?.find_phase(tdb);
        Ok(phase.rotation_model().orientation_at_time(tdb)
            * phase.body_frame().orientation_at_depth(tdb, depth + 1)?)
    }

    /// Velocity in the universal frame, km/day.
    pub fn get_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.velocity_at_depth(tdb, 0)
    }

    pub(crate) fn velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        ensure_depth(depth)?;
        let phase = self.timeline()?.find_phase(tdb);
        let orbit_frame = phase.orbit_frame();
        let center = orbit_frame.center();

        let mut v = orbit_frame.orientation_at_depth(tdb, depth + 1)?.conjugate()
            * phase.orbit().velocity_at_time(tdb)
            + center.velocity_at_depth(tdb, depth + 1)?;

        // Rigid-body correction for a rotating orbit frame.
        if !orbit_frame.is_inertial() {
            let r = self
                .position_at_depth(tdb, depth)?
                .offset_from_km(&center.position_at_depth(tdb, depth + 1)?);
            v += orbit_frame.angular_velocity_at_depth(tdb, depth + 1)?.cross(&r);
        }

        Ok(v)
    }

    /// Angular velocity in the universal frame, rad/day.
    pub fn get_angular_velocity(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.angular_velocity_at_depth(tdb, 0)
    }

    pub(crate) fn angular_velocity_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        ensure_depth(depth)?;
        let phase = self.timeline()?.find_phase(tdb);
        let body_frame = phase.body_frame();

        let mut v = body_frame.orientation_at_depth(tdb, depth + 1)?.conjugate()
            * phase.rotation_model().angular_velocity_at_time(tdb);

        // Angular velocities of nested rotating frames add linearly.
        if !body_frame.is_inertial() {
            v += body_frame.angular_velocity_at_depth(tdb, depth + 1)?;
        }

        Ok(v)
    }

    // --- astrocentric transforms ---------------------------------------

    /// Position of the body's center in astrocentric ecliptic coordinates
    /// (relative to the star or barycenter its frame chain terminates at).
    pub fn get_astrocentric_position(&self, tdb: f64) -> Result<Vector3<f64>> {
        self.astrocentric_at_depth(tdb, 0)
    }

    pub(crate) fn astrocentric_at_depth(&self, tdb: f64, depth: usize) -> Result<Vector3<f64>> {
        let phase = self.timeline()?.find_phase(tdb);
        let frame = phase.orbit_frame();
        astrocentric_from(
            frame.orientation_at_depth(tdb, depth)?,
            &frame.center(),
            &phase.orbit().position_at_time(tdb),
            tdb,
            depth,
        )
    }

    /// Transformation from body-local to astrocentric coordinates.
    pub fn get_local_to_astrocentric(&self, tdb: f64) -> Result<Matrix4<f64>> {
        let p = self.get_astrocentric_position(tdb)?;
        Ok(Translation3::from(p).to_homogeneous())
    }

    /// Rotation from the ecliptic frame to this body's frame.
    pub fn get_ecliptic_to_frame(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        let phase = self.timeline()?.find_phase(tdb);
        phase.body_frame().orientation(tdb)
    }

    /// Rotation from the ecliptic frame to the body's mean equatorial frame.
    pub fn get_ecliptic_to_equatorial(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        self.ecliptic_to_equatorial_at_depth(tdb, 0)
    }

    pub(crate) fn ecliptic_to_equatorial_at_depth(
        &self,
        tdb: f64,
        depth: usize,
    ) -> Result<UnitQuaternion<f64>> {
        ensure_depth(depth)?;
        let phase = self.timeline()?.find_phase(tdb);
        Ok(phase.rotation_model().equator_orientation_at_time(tdb)
            * phase.body_frame().orientation_at_depth(tdb, depth + 1)?)
    }

    /// Rotation from the ecliptic frame to the body-fixed frame.
    pub fn get_ecliptic_to_body_fixed(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        self.ecliptic_to_body_fixed_at_depth(tdb, 0)
    }

    pub(crate) fn ecliptic_to_body_fixed_at_depth(
        &self,
        tdb: f64,
        depth: usize,
    ) -> Result<UnitQuaternion<f64>> {
        self.orientation_at_depth(tdb, depth)
    }

    /// Rotation from the body's equatorial frame to the body-fixed frame:
    /// just the spin about the rotation axis.
    pub fn get_equatorial_to_body_fixed(&self, tdb: f64) -> Result<UnitQuaternion<f64>> {
        let phase = self.timeline()?.find_phase(tdb);
        Ok(phase.rotation_model().spin(tdb))
    }

    /// Transformation from the body-fixed frame to astrocentric coordinates,
    /// for placing rendered geometry.
    pub fn get_body_fixed_to_astrocentric(&self, tdb: f64) -> Result<Matrix4<f64>> {
        let m = self.get_equatorial_to_body_fixed(tdb)?.to_homogeneous();
        Ok(m * self.get_local_to_astrocentric(tdb)?)
    }

    // --- planetocentric coordinates ------------------------------------

    /// Convert planetocentric longitude/latitude (degrees) and altitude (km)
    /// to cartesian body-fixed coordinates.
    pub fn planetocentric_to_cartesian(&self, lon_deg: f64, lat_deg: f64, alt_km: f64) -> Vector3<f64> {
        let phi = lat_deg.to_radians();
        let theta = lon_deg.to_radians();
        let dir = Vector3::new(
            phi.cos() * theta.cos(),
            phi.cos() * theta.sin(),
            phi.sin(),
        );
        dir * (self.radius + alt_km)
    }

    /// Convert cartesian body-fixed coordinates to planetocentric
    /// (longitude rad, latitude rad, altitude km).
    pub fn cartesian_to_planetocentric(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let w = v.normalize();
        let lat = w.z.asin();
        let lon = w.y.atan2(w.x);
        Vector3::new(lon, lat, v.norm() - self.radius)
    }

    /// Convert body-centered ecliptic coordinates to planetocentric.
    pub fn ecliptic_to_planetocentric(&self, ecl: &Vector3<f64>, tdb: f64) -> Result<Vector3<f64>> {
        let bf = self.get_ecliptic_to_body_fixed(tdb)? * ecl;
        Ok(self.cartesian_to_planetocentric(&bf))
    }

    // --- physical attributes -------------------------------------------

    pub fn get_radius(&self) -> f64 {
        self.radius
    }

    /// Set the semi-axes; the radius is always the largest of the three.
    pub fn set_semi_axes(&mut self, semi_axes: Vector3<f64>) {
        self.semi_axes = semi_axes;
        self.radius = semi_axes.max();
        self.recompute_culling_radius();
    }

    pub fn get_semi_axes(&self) -> Vector3<f64> {
        self.semi_axes
    }

    pub fn is_sphere(&self) -> bool {
        self.geometry.is_none()
            && self.semi_axes.x == self.semi_axes.y
            && self.semi_axes.x == self.semi_axes.z
    }

    pub fn is_ellipsoid(&self) -> bool {
        self.geometry.is_none()
    }

    pub fn set_geometry(&mut self, resource: impl Into<String>) {
        self.geometry = Some(resource.into());
        self.recompute_culling_radius();
    }

    pub fn get_mass(&self) -> f64 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    /// Density in kg/m^3: the explicit value when set, otherwise derived for
    /// spherical bodies, otherwise 0.
    pub fn get_density(&self) -> f64 {
        if self.density > 0.0 {
            return self.density;
        }
        if self.radius == 0.0 || !self.is_sphere() {
            return 0.0;
        }
        let radius_m = self.radius * 1000.0;
        let volume = 4.0 / 3.0 * std::f64::consts::PI * radius_m.powi(3);
        self.mass / volume
    }

    pub fn set_density(&mut self, density: f64) {
        self.density = density;
    }

    pub fn get_geom_albedo(&self) -> f64 {
        self.geom_albedo
    }

    pub fn set_geom_albedo(&mut self, albedo: f64) {
        self.geom_albedo = albedo;
    }

    pub fn get_bond_albedo(&self) -> f64 {
        self.bond_albedo
    }

    pub fn set_bond_albedo(&mut self, albedo: f64) {
        self.bond_albedo = albedo;
    }

    pub fn get_reflectivity(&self) -> f64 {
        self.reflectivity
    }

    pub fn set_reflectivity(&mut self, reflectivity: f64) {
        self.reflectivity = reflectivity;
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn get_temp_discrepancy(&self) -> f64 {
        self.temp_discrepancy
    }

    pub fn set_temp_discrepancy(&mut self, discrepancy: f64) {
        self.temp_discrepancy = discrepancy;
    }

    /// Temperature in K: the explicit value when set, otherwise a blackbody
    /// estimate from the primary star. Returns 0 for degenerate inputs (no
    /// system, no star, zero distance).
    pub fn get_temperature(&self, tdb: f64) -> Result<f64> {
        if self.temperature > 0.0 {
            return Ok(self.temperature);
        }
        let Some(system) = self.system.upgrade() else {
            return Ok(0.0);
        };
        let Some(star) = system.borrow().star() else {
            return Ok(0.0);
        };
        let star = star.borrow();
        let dist = self.get_astrocentric_position(tdb)?.norm();
        if dist <= 0.0 {
            return Ok(0.0);
        }
        let temp = star.temperature()
            * (1.0 - self.bond_albedo).powf(0.25)
            * (star.radius() / (2.0 * dist)).sqrt();
        Ok(self.temp_discrepancy + temp)
    }

    // --- photometry ----------------------------------------------------

    /// Luminosity relative to solar: the fraction of the star's power this
    /// body reflects. Zero distance or zero radius returns 0 by policy.
    pub fn get_luminosity(&self, sun_luminosity: f64, distance_from_sun_km: f64) -> f64 {
        if distance_from_sun_km <= 0.0 || self.radius <= 0.0 {
            return 0.0;
        }
        let power = SOLAR_POWER_W * sun_luminosity;
        let irradiance = power / sphere_area(distance_from_sun_km * 1000.0);
        let incident = irradiance * circle_area(self.radius * 1000.0);
        let reflected = incident * self.reflectivity;
        reflected / SOLAR_POWER_W
    }

    /// Apparent magnitude neglecting phase (as if at opposition).
    pub fn get_apparent_magnitude(
        &self,
        sun_luminosity: f64,
        distance_from_sun_km: f64,
        distance_from_viewer_km: f64,
    ) -> f64 {
        lum_to_app_mag(
            self.get_luminosity(sun_luminosity, distance_from_sun_km),
            km_to_ly(distance_from_viewer_km),
        )
    }

    /// Apparent magnitude corrected for the illuminated fraction seen from
    /// the viewer. Positions are relative to the body, km.
    pub fn get_apparent_magnitude_with_phase(
        &self,
        sun_luminosity: f64,
        sun_position: Vector3<f64>,
        viewer_position: Vector3<f64>,
    ) -> f64 {
        let distance_to_viewer = viewer_position.norm();
        let distance_to_sun = sun_position.norm();
        if distance_to_viewer <= 0.0 || distance_to_sun <= 0.0 {
            return 0.0;
        }
        let illuminated_fraction = (1.0
            + (viewer_position / distance_to_viewer).dot(&(sun_position / distance_to_sun)))
            / 2.0;
        lum_to_app_mag(
            self.get_luminosity(sun_luminosity, distance_to_sun) * illuminated_fraction,
            km_to_ly(distance_to_viewer),
        )
    }

    // --- classification ------------------------------------------------

    pub fn classification(&self) -> BodyClassification {
        self.classification
    }

    pub fn set_classification(&mut self, classification: BodyClassification) {
        self.classification = classification;
        self.recompute_culling_radius();
        self.mark_changed();
    }

    /// Effective classification used when rendering orbits. Invisible bodies
    /// report the highest-priority classification present among their
    /// children, so an orbit defined relative to an invisible barycenter
    /// point is still shown at the scale of its members.
    pub fn get_orbit_classification(&self) -> BodyClassification {
        if self.classification != BodyClassification::Invisible {
            return self.classification;
        }
        let Some(tree) = &self.frame_tree else {
            return BodyClassification::Invisible;
        };
        let mask = tree.child_class_mask();
        for class in BodyClassification::ORBIT_PRIORITY {
            if mask.contains(class) {
                return class;
            }
        }
        BodyClassification::Invisible
    }

    // --- features ------------------------------------------------------

    pub fn get_atmosphere(&self) -> Option<&Atmosphere> {
        self.atmosphere.as_ref()
    }

    pub fn set_atmosphere(&mut self, atmosphere: Atmosphere) {
        self.atmosphere = Some(atmosphere);
        self.recompute_culling_radius();
    }

    pub fn get_rings(&self) -> Option<&RingSystem> {
        self.rings.as_ref()
    }

    pub fn set_rings(&mut self, rings: RingSystem) {
        self.rings = Some(rings);
        self.recompute_culling_radius();
    }

    pub fn add_reference_mark(&mut self, mark: Box<dyn ReferenceMark>) {
        self.reference_marks.push(mark);
        self.recompute_culling_radius();
    }

    /// Remove the first reference mark with the given tag.
    pub fn remove_reference_mark(&mut self, tag: &str) {
        if let Some(index) = self.reference_marks.iter().position(|m| m.tag() == tag) {
            self.reference_marks.remove(index);
            self.recompute_culling_radius();
        }
    }

    pub fn find_reference_mark(&self, tag: &str) -> Option<&dyn ReferenceMark> {
        self.reference_marks
            .iter()
            .find(|m| m.tag() == tag)
            .map(|m| m.as_ref())
    }

    pub fn reference_marks(&self) -> impl Iterator<Item = &dyn ReferenceMark> {
        self.reference_marks.iter().map(|m| m.as_ref())
    }

    // --- visibility flags ----------------------------------------------

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_clickable(&self) -> bool {
        self.clickable
    }

    pub fn set_clickable(&mut self, clickable: bool) {
        self.clickable = clickable;
    }

    pub fn is_visible_as_point(&self) -> bool {
        self.visible_as_point
    }

    pub fn set_visible_as_point(&mut self, visible_as_point: bool) {
        self.visible_as_point = visible_as_point;
    }

    pub fn is_secondary_illuminator(&self) -> bool {
        self.secondary_illuminator
    }

    pub fn set_secondary_illuminator(&mut self, enable: bool) {
        if enable != self.secondary_illuminator {
            self.secondary_illuminator = enable;
            self.mark_changed();
        }
    }

    // --- culling radius ------------------------------------------------

    /// Radius of a sphere containing the primary geometry only. Irregular
    /// geometry uses the axis-aligned bounding box semi-axis, so the
    /// enclosing sphere can be larger by sqrt(3).
    pub fn get_bounding_radius(&self) -> f64 {
        if self.geometry.is_some() {
            self.radius * 3.0_f64.sqrt()
        } else {
            self.radius
        }
    }

    /// Radius of a sphere containing everything attached to the body.
    pub fn get_culling_radius(&self) -> f64 {
        self.culling_radius
    }

    /// Recompute the culling radius from geometry, atmosphere, rings,
    /// reference marks, and classification. Fires the change notification
    /// only if the value actually moved.
    pub fn recompute_culling_radius(&mut self) {
        let mut r = self.get_bounding_radius();

        if let Some(atmosphere) = &self.atmosphere {
            r += atmosphere.height.max(atmosphere.cloud_height);
        }
        if let Some(rings) = &self.rings {
            r = r.max(rings.outer_radius);
        }
        for mark in &self.reference_marks {
            r = r.max(mark.bounding_sphere_radius());
        }
        if self.classification == BodyClassification::Comet {
            r = r.max(au_to_km(1.0));
        }

        if r != self.culling_radius {
            log::debug!("body {} culling radius {} -> {}", self.names[0], self.culling_radius, r);
            self.culling_radius = r;
            self.mark_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::EclipticJ2000;
    use crate::orbits::FixedPoint;
    use crate::rotation::FixedRotation;
    use crate::selection::Selection;
    use crate::timeline::TimelinePhase;
    use approx::assert_relative_eq;

    fn fixed_timeline(start: f64, end: f64) -> Timeline {
        Timeline::single(
            TimelinePhase::new(
                start,
                end,
                EclipticJ2000::shared(Selection::None),
                Rc::new(FixedPoint::new(Vector3::zeros())),
                EclipticJ2000::shared(Selection::None),
                Rc::new(FixedRotation::identity()),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_names_and_aliases() {
        let body = Body::new("Earth");
        body.borrow_mut().set_localized_name("Terre");
        Body::add_alias(&body, "Sol III");
        Body::add_alias(&body, "Earth"); // primary name; ignored

        let body = body.borrow();
        assert_eq!(body.names(), &["Earth".to_string(), "Sol III".to_string()]);
        assert_eq!(body.get_name(false), "Earth");
        assert_eq!(body.get_name(true), "Terre");
        assert!(body.has_localized_name());
    }

    #[test]
    fn test_lifespan_and_extant() {
        let body = Body::new("lander");
        assert!(!body.borrow().extant(0.0));
        assert_eq!(body.borrow().get_lifespan(), None);

        body.borrow_mut().set_timeline(fixed_timeline(100.0, 200.0));
        let body = body.borrow();
        assert_eq!(body.get_lifespan(), Some((100.0, 200.0)));
        assert!(body.extant(100.0));
        assert!(body.extant(199.9));
        assert!(!body.extant(200.0));
        assert!(!body.extant(99.9));
    }

    #[test]
    fn test_query_without_timeline_fails() {
        let body = Body::new("limbo");
        assert!(matches!(
            body.borrow().get_position(0.0),
            Err(OrreryError::MissingTimeline(_))
        ));
    }

    #[test]
    fn test_semi_axes_drive_radius() {
        let body = Body::new("spud");
        body.borrow_mut()
            .set_semi_axes(Vector3::new(10.0, 30.0, 20.0));
        let body = body.borrow();
        assert_relative_eq!(body.get_radius(), 30.0);
        assert!(!body.is_sphere());
        assert!(body.is_ellipsoid());
    }

    #[test]
    fn test_density_derived_and_degenerate() {
        let body = Body::new("ball");
        {
            let mut b = body.borrow_mut();
            b.set_semi_axes(Vector3::new(1000.0, 1000.0, 1000.0));
            b.set_mass(4.2e21);
        }
        let expected = 4.2e21 / (4.0 / 3.0 * std::f64::consts::PI * (1.0e6_f64).powi(3));
        assert_relative_eq!(body.borrow().get_density(), expected, max_relative = 1e-12);

        // Non-spherical with no explicit density: defined 0.
        body.borrow_mut().set_semi_axes(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(body.borrow().get_density(), 0.0);

        body.borrow_mut().set_density(5500.0);
        assert_eq!(body.borrow().get_density(), 5500.0);
    }

    #[test]
    fn test_luminosity_zero_distance_policy() {
        let body = Body::new("rock");
        assert_eq!(body.borrow().get_luminosity(1.0, 0.0), 0.0);
        assert_eq!(body.borrow().get_apparent_magnitude(1.0, 0.0, 1.0e6), 0.0);
    }

    #[test]
    fn test_luminosity_inverse_square() {
        let body = Body::new("rock");
        body.borrow_mut()
            .set_semi_axes(Vector3::new(1000.0, 1000.0, 1000.0));
        let body = body.borrow();
        let near = body.get_luminosity(1.0, 1.0e8);
        let far = body.get_luminosity(1.0, 2.0e8);
        assert_relative_eq!(near / far, 4.0, max_relative = 1e-12);
    }

    #[test]
    fn test_phase_correction_dims_partial_illumination() {
        let body = Body::new("rock");
        body.borrow_mut()
            .set_semi_axes(Vector3::new(1000.0, 1000.0, 1000.0));
        let body = body.borrow();
        let sun = Vector3::new(1.0e8, 0.0, 0.0);
        // A sunward viewer sees a fully lit disc; a viewer at quadrature
        // sees half of it.
        let full = body.get_apparent_magnitude_with_phase(1.0, sun, Vector3::new(1.0e6, 0.0, 0.0));
        let half = body.get_apparent_magnitude_with_phase(1.0, sun, Vector3::new(0.0, 1.0e6, 0.0));
        assert!(full < half, "full phase should be brighter: {full} vs {half}");
    }

    #[test]
    fn test_culling_radius_monotonic_and_notification() {
        let body = Body::new("saturn");
        body.borrow_mut().set_timeline(fixed_timeline(0.0, 1.0));
        {
            let b = body.borrow();
            b.get_timeline().unwrap().clear_changed();
        }

        let r0 = body.borrow().get_culling_radius();
        body.borrow_mut().set_semi_axes(Vector3::new(60_268.0, 60_268.0, 54_364.0));
        let r1 = body.borrow().get_culling_radius();
        assert!(r1 > r0);
        assert!(body.borrow().get_timeline().unwrap().is_changed());

        body.borrow().get_timeline().unwrap().clear_changed();
        body.borrow_mut().set_rings(RingSystem {
            inner_radius: 74_500.0,
            outer_radius: 140_220.0,
        });
        let r2 = body.borrow().get_culling_radius();
        assert!(r2 >= r1);
        assert_relative_eq!(r2, 140_220.0);
        assert!(body.borrow().get_timeline().unwrap().is_changed());

        // No-op recompute: no new notification.
        body.borrow().get_timeline().unwrap().clear_changed();
        body.borrow_mut().recompute_culling_radius();
        assert!(!body.borrow().get_timeline().unwrap().is_changed());

        body.borrow_mut().set_atmosphere(Atmosphere {
            height: 1000.0,
            cloud_height: 200.0,
        });
        let r3 = body.borrow().get_culling_radius();
        assert!(r3 >= r2);

        body.borrow_mut()
            .add_reference_mark(Box::new(SphereMark::new("grid", 5.0e5)));
        assert_relative_eq!(body.borrow().get_culling_radius(), 5.0e5);
    }

    #[test]
    fn test_comet_gets_au_floor() {
        let body = Body::new("halley");
        body.borrow_mut()
            .set_classification(BodyClassification::Comet);
        assert_relative_eq!(body.borrow().get_culling_radius(), au_to_km(1.0));
    }

    #[test]
    fn test_mesh_geometry_inflates_bounding_radius() {
        let body = Body::new("phobos");
        body.borrow_mut().set_semi_axes(Vector3::new(13.0, 11.4, 9.1));
        assert_relative_eq!(body.borrow().get_bounding_radius(), 13.0);
        body.borrow_mut().set_geometry("phobos.mesh");
        assert_relative_eq!(body.borrow().get_bounding_radius(), 13.0 * 3.0_f64.sqrt());
    }

    #[test]
    fn test_orbit_classification_priority() {
        let body = Body::new("pair");
        body.borrow_mut()
            .set_classification(BodyClassification::Invisible);
        // No children: stays invisible.
        assert_eq!(
            body.borrow().get_orbit_classification(),
            BodyClassification::Invisible
        );

        let tree = Body::get_or_create_frame_tree(&body);
        let moon = Body::new("moon");
        moon.borrow_mut().set_classification(BodyClassification::Moon);
        let rock = Body::new("rock");
        rock.borrow_mut()
            .set_classification(BodyClassification::Asteroid);
        tree.add_child(&moon);
        tree.add_child(&rock);

        // Asteroid outranks Moon in the fixed priority order.
        assert_eq!(
            body.borrow().get_orbit_classification(),
            BodyClassification::Asteroid
        );

        let planet = Body::new("planet");
        planet
            .borrow_mut()
            .set_classification(BodyClassification::Planet);
        tree.add_child(&planet);
        assert_eq!(
            body.borrow().get_orbit_classification(),
            BodyClassification::Planet
        );

        // Visible bodies report their own classification untouched.
        body.borrow_mut()
            .set_classification(BodyClassification::Spacecraft);
        assert_eq!(
            body.borrow().get_orbit_classification(),
            BodyClassification::Spacecraft
        );
    }

    #[test]
    fn test_reference_mark_lookup_and_removal() {
        let body = Body::new("iss");
        body.borrow_mut()
            .add_reference_mark(Box::new(SphereMark::new("axes", 12.0)));
        body.borrow_mut()
            .add_reference_mark(Box::new(SphereMark::new("velocity", 30.0)));
        assert!(body.borrow().find_reference_mark("axes").is_some());
        assert_relative_eq!(body.borrow().get_culling_radius(), 30.0);

        body.borrow_mut().remove_reference_mark("velocity");
        assert!(body.borrow().find_reference_mark("velocity").is_none());
        assert_relative_eq!(body.borrow().get_culling_radius(), 12.0);
    }
}
