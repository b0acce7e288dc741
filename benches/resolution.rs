//! Benchmarks for state resolution over a nested hierarchy.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orrery::body::{Body, BodyRef};
use orrery::constants::J2000;
use orrery::frames::EclipticJ2000;
use orrery::orbits::CircularOrbit;
use orrery::rotation::UniformRotation;
use orrery::selection::{Selection, Star, StarRef};
use orrery::system::{PlanetarySystem, SystemRef};
use orrery::timeline::{Timeline, TimelinePhase};
use std::rc::Rc;

/// A chain of `depth` bodies, each orbiting the previous one. The root
/// system and star are returned alongside the leaf so the ancestor chain
/// stays alive.
fn nested_chain(depth: usize) -> (StarRef, SystemRef, BodyRef) {
    assert!(depth >= 1);
    let sol = Star::new("Sol", 695_700.0, 5772.0, 1.0).into_ref();
    let root = PlanetarySystem::around_star(&sol);

    let mut center = Selection::from_star(&sol);
    let mut current_system = root.clone();
    let mut leaf = None;
    for level in 0..depth {
        let body = Body::new(format!("level-{level}"));
        PlanetarySystem::add_body(&current_system, &body);
        let frame = EclipticJ2000::shared(center.clone());
        body.borrow_mut().set_timeline(Timeline::single(
            TimelinePhase::new(
                f64::NEG_INFINITY,
                f64::INFINITY,
                frame.clone(),
                Rc::new(CircularOrbit::new(
                    1.0e8 / (level + 1) as f64,
                    365.25 / (level + 1) as f64,
                    J2000,
                    0.0,
                )),
                frame,
                Rc::new(UniformRotation::simple(1.0, 0.0, J2000)),
            )
            .unwrap(),
        ));
        center = Selection::from_body(&body);
        current_system = PlanetarySystem::around_body(&body);
        leaf = Some(body);
    }
    (sol, root, leaf.unwrap())
}

fn bench_resolution(c: &mut Criterion) {
    for depth in [1usize, 4, 16] {
        let (_sol, _root, leaf) = nested_chain(depth);
        c.bench_function(&format!("get_position depth {depth}"), |b| {
            let leaf = leaf.borrow();
            let mut t = J2000;
            b.iter(|| {
                t += 0.01;
                black_box(leaf.get_position(black_box(t)).unwrap())
            })
        });
        c.bench_function(&format!("get_velocity depth {depth}"), |b| {
            let leaf = leaf.borrow();
            let mut t = J2000;
            b.iter(|| {
                t += 0.01;
                black_box(leaf.get_velocity(black_box(t)).unwrap())
            })
        });
    }

    let (_sol, _root, leaf) = nested_chain(4);
    c.bench_function("get_orientation", |b| {
        let leaf = leaf.borrow();
        b.iter(|| black_box(leaf.get_orientation(black_box(J2000 + 12.5)).unwrap()))
    });
    c.bench_function("astrocentric depth 4", |b| {
        let leaf = leaf.borrow();
        b.iter(|| {
            black_box(
                leaf.get_astrocentric_position(black_box(J2000 + 12.5))
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
