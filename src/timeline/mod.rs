//! Timelines and timeline phases
//!
//! A [`Timeline`] partitions a body's existence into contiguous,
//! non-overlapping [`TimelinePhase`] intervals sorted by start time. Each
//! phase binds the orbit frame, orbit, body frame, and rotation model active
//! over `[start_tdb, end_tdb)`. Structural problems (no phases, gaps,
//! overlaps) are rejected when the timeline is built, never at query time:
//! `find_phase` is total and clamps out-of-range instants to the boundary
//! phases.

use crate::frames::FrameRef;
use crate::orbits::OrbitRef;
use crate::rotation::RotationModelRef;
use std::cell::Cell;
use thiserror::Error;

/// Construction-time timeline validation errors.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("a timeline requires at least one phase")]
    Empty,

    #[error("phase interval is empty or inverted: start {start} >= end {end}")]
    EmptyInterval { start: f64, end: f64 },

    #[error(
        "phase {index} starting at {start} does not continue from the \
         previous phase ending at {previous_end}"
    )]
    Discontinuous {
        index: usize,
        start: f64,
        previous_end: f64,
    },
}

/// One interval of a timeline, with its frame/orbit/rotation assignment.
///
/// Immutable value; the strategy objects are shared by reference and may be
/// reused across phases and across bodies.
#[derive(Clone)]
pub struct TimelinePhase {
    start: f64,
    end: f64,
    orbit_frame: FrameRef,
    orbit: OrbitRef,
    body_frame: FrameRef,
    rotation_model: RotationModelRef,
}

impl TimelinePhase {
    pub fn new(
        start: f64,
        end: f64,
        orbit_frame: FrameRef,
        orbit: OrbitRef,
        body_frame: FrameRef,
        rotation_model: RotationModelRef,
    ) -> Result<Self, TimelineError> {
        if start >= end {
            return Err(TimelineError::EmptyInterval { start, end });
        }
        Ok(TimelinePhase {
            start,
            end,
            orbit_frame,
            orbit,
            body_frame,
            rotation_model,
        })
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }

    pub fn end_time(&self) -> f64 {
        self.end
    }

    /// True if `tdb` falls inside this phase's half-open interval.
    pub fn includes(&self, tdb: f64) -> bool {
        self.start <= tdb && tdb < self.end
    }

    pub fn orbit_frame(&self) -> &FrameRef {
        &self.orbit_frame
    }

    pub fn orbit(&self) -> &OrbitRef {
        &self.orbit
    }

    pub fn body_frame(&self) -> &FrameRef {
        &self.body_frame
    }

    pub fn rotation_model(&self) -> &RotationModelRef {
        &self.rotation_model
    }
}

/// Ordered, contiguous sequence of phases covering a body's existence.
pub struct Timeline {
    phases: Vec<TimelinePhase>,
    changed: Cell<bool>,
}

impl Timeline {
    /// Build a timeline, validating phase ordering and contiguity.
    pub fn new(phases: Vec<TimelinePhase>) -> Result<Self, TimelineError> {
        if phases.is_empty() {
            return Err(TimelineError::Empty);
        }
        for (index, pair) in phases.windows(2).enumerate() {
            let previous_end = pair[0].end_time();
            let start = pair[1].start_time();
            if start != previous_end {
                return Err(TimelineError::Discontinuous {
                    index: index + 1,
                    start,
                    previous_end,
                });
            }
        }
        Ok(Timeline {
            phases,
            changed: Cell::new(false),
        })
    }

    /// Convenience constructor for the common single-phase case.
    pub fn single(phase: TimelinePhase) -> Self {
        Timeline {
            phases: vec![phase],
            changed: Cell::new(false),
        }
    }

    /// The phase whose interval contains `tdb`, clamping to the first phase
    /// before the timeline starts and to the last phase at or after it ends.
    ///
    /// Binary search on start times; phases are sorted and contiguous by
    /// construction.
    pub fn find_phase(&self, tdb: f64) -> &TimelinePhase {
        let after_start = self.phases.partition_point(|p| p.start_time() <= tdb);
        let index = after_start.saturating_sub(1);
        &self.phases[index]
    }

    /// True if `tdb` falls within the timeline's overall span.
    pub fn includes(&self, tdb: f64) -> bool {
        self.start_time() <= tdb && tdb < self.end_time()
    }

    pub fn start_time(&self) -> f64 {
        self.phases[0].start_time()
    }

    pub fn end_time(&self) -> f64 {
        self.phases[self.phases.len() - 1].end_time()
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn phase(&self, index: usize) -> Option<&TimelinePhase> {
        self.phases.get(index)
    }

    /// Pure notification: flags the timeline dirty without recomputing
    /// anything. Consumers holding derived caches check and clear the flag
    /// on their next pass.
    pub fn mark_changed(&self) {
        self.changed.set(true);
    }

    pub fn is_changed(&self) -> bool {
        self.changed.get()
    }

    pub fn clear_changed(&self) {
        self.changed.set(false);
    }
}
