//! # orrery
//!
//! Hierarchical reference-frame and timeline resolution for solar system
//! simulation. The crate answers one question: given a body embedded in a
//! tree of orbits, reference frames, and rotation models, any of which may
//! change over the body's lifetime, what are its position, orientation,
//! velocity, and angular velocity at a TDB instant?
//!
//! The moving parts:
//!
//! * [`coords::UniversalCoord`]: high-precision positions spanning
//!   interstellar distances without losing planetary-surface resolution
//! * [`orbits::Orbit`] and [`rotation::RotationModel`]: pluggable
//!   trajectory and spin strategies
//! * [`frames::ReferenceFrame`]: coordinate frames centered on other
//!   objects, inertial or rotating
//! * [`timeline::Timeline`]: contiguous phases binding a body to an orbit,
//!   frames, and a rotation model over an interval
//! * [`body::Body`] and [`system::PlanetarySystem`]: the object hierarchy
//!   and name lookup
//! * [`selection::Selection`]: a weak handle unifying bodies, stars, and
//!   barycenters as frame centers
//!
//! Units: time is a TDB Julian date in days, distances are kilometers,
//! velocities km/day, angular velocities rad/day.

use thiserror::Error;

pub mod body;
pub mod constants;
pub mod coords;
pub mod frames;
pub mod frametree;
pub mod orbits;
pub mod rotation;
pub mod selection;
pub mod system;
pub mod time;
pub mod timeline;

pub use body::{Body, BodyClassification, BodyRef};
pub use coords::UniversalCoord;
pub use frames::{FrameRef, ReferenceFrame};
pub use orbits::{Orbit, OrbitRef};
pub use rotation::{RotationModel, RotationModelRef};
pub use selection::Selection;
pub use system::{PlanetarySystem, SystemRef};
pub use timeline::{Timeline, TimelinePhase};

/// Maximum depth for any frame-center or anchor chain. Well-formed
/// hierarchies are far shallower; hitting the cap means the graph is cyclic
/// or pathological, and resolution fails rather than recursing forever.
pub const MAX_FRAME_DEPTH: usize = 64;

#[derive(Error, Debug)]
pub enum OrreryError {
    #[error("timeline error: {0}")]
    Timeline(#[from] timeline::TimelineError),

    #[error("frame chain exceeds maximum depth {0}; the frame graph is cyclic")]
    FrameDepthExceeded(usize),

    #[error("reference to dropped object: {0}")]
    DanglingReference(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("body {0} has no timeline")]
    MissingTimeline(String),
}

pub type Result<T> = std::result::Result<T, OrreryError>;

/// Guard recursive frame resolution against cyclic center graphs.
pub(crate) fn ensure_depth(depth: usize) -> Result<()> {
    if depth > MAX_FRAME_DEPTH {
        log::error!("frame chain exceeded depth {MAX_FRAME_DEPTH}");
        return Err(OrreryError::FrameDepthExceeded(MAX_FRAME_DEPTH));
    }
    Ok(())
}
