//! High-precision universal coordinates
//!
//! Absolute positions in a simulated universe span interstellar scales
//! (~1e13 km and beyond) while offsets inside a planetary system are a few
//! 1e6..1e9 km. A single `f64` component loses sub-kilometer resolution near
//! large absolute coordinates, so [`UniversalCoord`] stores each axis as an
//! unevaluated `(hi, lo)` double pair maintained with error-free two-sum
//! transforms. Relative offsets stay plain `Vector3<f64>` in kilometers;
//! only the final "offset an absolute coordinate" step pays for the extra
//! precision.

use crate::constants::{km_to_ly, ly_to_km};
use nalgebra::Vector3;

/// Error-free transform: `a + b = s + err` exactly (Knuth two-sum).
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bv = s - a;
    let err = (a - (s - bv)) + (b - bv);
    (s, err)
}

/// Faster variant of [`two_sum`], valid when `|a| >= |b|`.
#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let err = b - (s - a);
    (s, err)
}

/// One coordinate axis stored as an unevaluated sum `hi + lo`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct SplitAxis {
    hi: f64,
    lo: f64,
}

impl SplitAxis {
    #[inline]
    fn new(value: f64) -> Self {
        SplitAxis { hi: value, lo: 0.0 }
    }

    /// Add a plain double, renormalizing so `hi` carries the leading bits.
    #[inline]
    fn add(self, rhs: f64) -> Self {
        let (s, e) = two_sum(self.hi, rhs);
        let (hi, lo) = quick_two_sum(s, self.lo + e);
        SplitAxis { hi, lo }
    }

    /// Difference from another axis as a plain double.
    ///
    /// The `hi` components of nearby coordinates mostly cancel exactly, so
    /// taking their difference before folding in the residuals preserves the
    /// fine-grained separation.
    #[inline]
    fn sub(self, rhs: SplitAxis) -> f64 {
        (self.hi - rhs.hi) + (self.lo - rhs.lo)
    }

    #[inline]
    fn value(self) -> f64 {
        self.hi + self.lo
    }
}

/// Absolute position in the universal (J2000 ecliptic) frame.
///
/// Component resolution is roughly the square of plain `f64`: offsetting a
/// coordinate ~1e13 km from the origin by a ~1e9 km vector and subtracting
/// the original recovers the offset to well below a meter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniversalCoord {
    x: SplitAxis,
    y: SplitAxis,
    z: SplitAxis,
}

impl UniversalCoord {
    /// The universal origin (solar system barycenter by convention).
    pub fn origin() -> Self {
        Self::default()
    }

    /// Create a coordinate from kilometer components.
    pub fn from_km(v: Vector3<f64>) -> Self {
        UniversalCoord {
            x: SplitAxis::new(v.x),
            y: SplitAxis::new(v.y),
            z: SplitAxis::new(v.z),
        }
    }

    /// Create a coordinate from light-year components.
    pub fn from_ly(v: Vector3<f64>) -> Self {
        Self::from_km(Vector3::new(ly_to_km(v.x), ly_to_km(v.y), ly_to_km(v.z)))
    }

    /// Offset this coordinate by a kilometer vector, preserving precision.
    pub fn offset_km(&self, offset: Vector3<f64>) -> Self {
        UniversalCoord {
            x: self.x.add(offset.x),
            y: self.y.add(offset.y),
            z: self.z.add(offset.z),
        }
    }

    /// Vector from `other` to `self` in kilometers.
    pub fn offset_from_km(&self, other: &UniversalCoord) -> Vector3<f64> {
        Vector3::new(
            self.x.sub(other.x),
            self.y.sub(other.y),
            self.z.sub(other.z),
        )
    }

    /// Distance from another coordinate in kilometers.
    pub fn distance_from_km(&self, other: &UniversalCoord) -> f64 {
        self.offset_from_km(other).norm()
    }

    /// Distance from another coordinate in light-years.
    pub fn distance_from_ly(&self, other: &UniversalCoord) -> f64 {
        km_to_ly(self.distance_from_km(other))
    }

    /// Collapse to a plain kilometer vector. Lossy at large magnitudes; only
    /// for display and for consumers that tolerate kilometer-level error.
    pub fn to_km(&self) -> Vector3<f64> {
        Vector3::new(self.x.value(), self.y.value(), self.z.value())
    }
}
