//! Axis-aligned bounding boxes for broad-phase filtering.

use nalgebra::Vector3;

use crate::geom3::Triangle;

/// Closed box `[min, max]`.
///
/// Invariants:
/// - For boxes built from points, `min <= max` componentwise. An empty point
///   set yields the degenerate box at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Vector3<f64>>,
    {
        let mut it = points.into_iter();
        let Some(first) = it.next() else {
            return Self::new(Vector3::zeros(), Vector3::zeros());
        };
        it.fold(Self::new(*first, *first), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        })
    }

    #[inline]
    pub fn from_triangle(tri: &Triangle) -> Self {
        Self::from_points(tri.iter())
    }

    /// Overlap test with tolerance: boxes closer than `eps` on every axis
    /// count as intersecting.
    #[inline]
    pub fn intersects(&self, other: &Aabb, eps: f64) -> bool {
        (0..3).all(|i| {
            !(self.max[i] < other.min[i] - eps || self.min[i] > other.max[i] + eps)
        })
    }

    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    #[inline]
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Index of the axis with the greatest extent (ties resolve to the lower index).
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    #[inline]
    pub fn contains_point(&self, p: &Vector3<f64>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn surface_area(&self) -> f64 {
        let e = self.extent();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    #[inline]
    pub fn padded(&self, pad: f64) -> Aabb {
        let d = Vector3::repeat(pad);
        Aabb {
            min: self.min - d,
            max: self.max + d,
        }
    }
}
