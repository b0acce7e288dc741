//! Solar System State Vector Tool
//!
//! This binary builds a small demonstration hierarchy (Sun, Earth, Moon, and
//! a geostationary station in Earth's body-fixed frame) and prints resolved
//! state vectors for a chosen object at a chosen instant.
//!
//! Usage:
//!   cargo run --bin orrery_info -- [--date 2026-08-30T00:00:00] [--jd 2461282.5] [Moon]

use clap::{ArgAction, Parser};
use nalgebra::Vector3;
use orrery::body::{Body, BodyClassification};
use orrery::constants::J2000;
use orrery::frames::{BodyFixedFrame, EclipticJ2000};
use orrery::orbits::{CircularOrbit, FixedPoint};
use orrery::rotation::{FixedRotation, UniformRotation};
use orrery::selection::{Selection, Star};
use orrery::system::{PlanetarySystem, SystemRef};
use orrery::time::datetime_to_jd;
use orrery::timeline::{Timeline, TimelinePhase};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Solar System State Vector Tool
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resolves and displays state vectors for bodies in a demo hierarchy",
    long_about = None
)]
struct Args {
    /// UTC-like calendar instant, e.g. 2026-08-30T12:00:00
    #[arg(short, long)]
    date: Option<String>,

    /// TDB Julian date; overrides --date
    #[arg(short, long)]
    jd: Option<f64>,

    /// Print state for every body in the hierarchy
    #[arg(short, long, action = ArgAction::SetTrue)]
    all: bool,

    /// Object to resolve
    #[arg(default_value = "Earth")]
    target: String,
}

/// Prints a section header with a title and separator line
fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

fn single_phase_timeline(
    orbit_center: Selection,
    orbit: orrery::OrbitRef,
    rotation: orrery::RotationModelRef,
) -> Result<Timeline> {
    Ok(Timeline::single(TimelinePhase::new(
        f64::NEG_INFINITY,
        f64::INFINITY,
        EclipticJ2000::shared(orbit_center.clone()),
        orbit,
        EclipticJ2000::shared(orbit_center),
        rotation,
    )?))
}

/// Build the demonstration hierarchy: Sun at the origin, Earth and Moon on
/// circular orbits, and a station at rest in Earth's body-fixed frame.
fn build_scene() -> Result<SystemRef> {
    let sol = Star::new("Sol", 695_700.0, 5772.0, 1.0).into_ref();
    let system = PlanetarySystem::around_star(&sol);

    let earth = Body::new("Earth");
    PlanetarySystem::add_body(&system, &earth);
    earth.borrow_mut().set_timeline(single_phase_timeline(
        Selection::from_star(&sol),
        Rc::new(CircularOrbit::new(1.496e8, 365.25, J2000, 0.0)),
        Rc::new(UniformRotation::simple(0.997_269_68, 0.0, J2000)),
    )?);
    {
        let mut e = earth.borrow_mut();
        e.set_classification(BodyClassification::Planet);
        e.set_semi_axes(Vector3::new(6378.1, 6378.1, 6356.8));
        e.set_bond_albedo(0.306);
        e.set_reflectivity(0.3);
        e.set_mass(5.972e24);
    }

    let moons = PlanetarySystem::around_body(&earth);
    let moon = Body::new("Moon");
    PlanetarySystem::add_body(&moons, &moon);
    moon.borrow_mut().set_timeline(single_phase_timeline(
        Selection::from_body(&earth),
        Rc::new(CircularOrbit::new(384_400.0, 27.321_661, J2000, 0.0)),
        Rc::new(UniformRotation::simple(27.321_661, 0.0, J2000)),
    )?);
    {
        let mut m = moon.borrow_mut();
        m.set_classification(BodyClassification::Moon);
        m.set_semi_axes(Vector3::new(1738.1, 1738.1, 1736.0));
        m.set_bond_albedo(0.11);
        m.set_reflectivity(0.12);
        m.set_mass(7.342e22);
    }
    Body::get_or_create_frame_tree(&earth).add_child(&moon);

    let station = Body::new("Station");
    PlanetarySystem::add_body(&moons, &station);
    station.borrow_mut().set_timeline(Timeline::single(TimelinePhase::new(
        f64::NEG_INFINITY,
        f64::INFINITY,
        BodyFixedFrame::shared(Selection::from_body(&earth)),
        Rc::new(FixedPoint::new(Vector3::new(42_164.0, 0.0, 0.0))),
        EclipticJ2000::shared(Selection::from_body(&earth)),
        Rc::new(FixedRotation::identity()),
    )?));
    station
        .borrow_mut()
        .set_classification(BodyClassification::Spacecraft);
    Body::get_or_create_frame_tree(&earth).add_child(&station);

    // An invisible point on Earth's orbit with a spacecraft as its only
    // child; its orbit classification derives from that child.
    let point = Body::new("L4 point");
    PlanetarySystem::add_body(&system, &point);
    point.borrow_mut().set_timeline(single_phase_timeline(
        Selection::from_star(&sol),
        Rc::new(CircularOrbit::new(1.496e8, 365.25, J2000, 60.0_f64.to_radians())),
        Rc::new(FixedRotation::identity()),
    )?);
    point
        .borrow_mut()
        .set_classification(BodyClassification::Invisible);

    let relay = Body::new("Relay");
    let satellites = PlanetarySystem::around_body(&point);
    PlanetarySystem::add_body(&satellites, &relay);
    relay.borrow_mut().set_timeline(single_phase_timeline(
        Selection::from_body(&point),
        Rc::new(CircularOrbit::new(10_000.0, 5.0, J2000, 0.0)),
        Rc::new(FixedRotation::identity()),
    )?);
    relay
        .borrow_mut()
        .set_classification(BodyClassification::Spacecraft);
    Body::get_or_create_frame_tree(&point).add_child(&relay);

    Ok(system)
}

fn resolve_time(args: &Args) -> Result<f64> {
    if let Some(jd) = args.jd {
        return Ok(jd);
    }
    if let Some(date) = &args.date {
        let parsed = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")?;
        return Ok(datetime_to_jd(&parsed.and_utc()));
    }
    Ok(J2000)
}

fn print_body_state(body: &orrery::BodyRef, tdb: f64) -> Result<()> {
    let body = body.borrow();
    print_section_header(&body.get_name(true));

    println!("Classification: {:?}", body.classification());
    println!("Orbit classification: {:?}", body.get_orbit_classification());
    if let Some((start, end)) = body.get_lifespan() {
        println!("Lifespan (TDB JD): [{}, {})", start, end);
    }
    println!("Radius: {:.1} km", body.get_radius());
    println!("Culling radius: {:.1} km", body.get_culling_radius());

    let position = body.get_position(tdb)?;
    let velocity = body.get_velocity(tdb)?;
    let angular_velocity = body.get_angular_velocity(tdb)?;
    let astro = body.get_astrocentric_position(tdb)?;

    let p = position.to_km();
    println!("Position (universal, km): [{:.3}, {:.3}, {:.3}]", p.x, p.y, p.z);
    println!(
        "Astrocentric position (km): [{:.3}, {:.3}, {:.3}]  |r| = {:.3}",
        astro.x,
        astro.y,
        astro.z,
        astro.norm()
    );
    println!(
        "Velocity (km/day): [{:.3}, {:.3}, {:.3}]  |v| = {:.3}",
        velocity.x,
        velocity.y,
        velocity.z,
        velocity.norm()
    );
    println!(
        "Angular velocity (rad/day): [{:.6}, {:.6}, {:.6}]",
        angular_velocity.x, angular_velocity.y, angular_velocity.z
    );
    println!("Temperature estimate: {:.1} K", body.get_temperature(tdb)?);

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tdb = resolve_time(&args)?;
    let system = build_scene()?;

    println!("Epoch: TDB JD {:.6} ({:+.3} days from J2000)", tdb, tdb - J2000);

    if args.all {
        let mut failure: Option<orrery::OrreryError> = None;
        system.borrow().traverse(&mut |body| {
            if let Err(err) = print_body_state(body, tdb) {
                eprintln!("error resolving {}: {}", body.borrow().get_name(false), err);
                if let Ok(err) = err.downcast::<orrery::OrreryError>() {
                    failure = Some(*err);
                }
                return false;
            }
            true
        });
        if let Some(err) = failure {
            return Err(Box::new(err));
        }
        return Ok(());
    }

    let body = system
        .borrow()
        .find(&args.target, true, true)
        .ok_or_else(|| orrery::OrreryError::ObjectNotFound(args.target.clone()))?;
    print_body_state(&body, tdb)
}
