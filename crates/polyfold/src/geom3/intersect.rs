//! Narrow-phase predicates: ray–triangle and triangle–triangle.
//!
//! Conventions
//! - Triangles are `[Vector3<f64>; 3]` in face winding order.
//! - `eps` is an absolute distance tolerance.
//!
//! The triangle–triangle test is conservative: it only runs the two plane
//! rejection stages of Möller's test and reports a hit whenever neither plane
//! separates the pair. Coplanar pairs and pairs whose planes cross both
//! triangles therefore count as intersecting without an interval check.

use nalgebra::Vector3;

pub type Triangle = [Vector3<f64>; 3];

/// Möller–Trumbore. Returns the ray parameter `t > eps` of the hit, or `None`
/// if the ray is parallel to the triangle or misses it.
pub fn ray_triangle_intersection(
    origin: Vector3<f64>,
    direction: Vector3<f64>,
    tri: &Triangle,
    eps: f64,
) -> Option<f64> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < eps {
        return None;
    }
    let f = 1.0 / a;
    let s = origin - tri[0];
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(&q);
    (t > eps).then_some(t)
}

/// Conservative triangle–triangle overlap test.
///
/// Returns `false` for degenerate triangles (normal shorter than `eps`) and
/// when either triangle lies entirely on one side of the other's plane.
/// Vertices within `eps` of a plane count as touching, not crossing.
pub fn triangles_intersect(t1: &Triangle, t2: &Triangle, eps: f64) -> bool {
    let Some(d2) = plane_distances(t1, t2, eps) else {
        return false;
    };
    if one_sided(&d2) {
        return false;
    }
    let Some(d1) = plane_distances(t2, t1, eps) else {
        return false;
    };
    if one_sided(&d1) {
        return false;
    }
    // Both planes cut (or contain) the other triangle; no interval test follows.
    true
}

/// Signed distances of `other`'s vertices to the plane of `tri`, snapped to 0
/// within `eps`. `None` if `tri` is degenerate.
fn plane_distances(tri: &Triangle, other: &Triangle, eps: f64) -> Option<[f64; 3]> {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let len = n.norm();
    if !(len >= eps) {
        return None;
    }
    let n = n / len;
    let d = -n.dot(&tri[0]);
    let signed = |p: &Vector3<f64>| {
        let s = n.dot(p) + d;
        if s.abs() < eps {
            0.0
        } else {
            s
        }
    };
    Some([signed(&other[0]), signed(&other[1]), signed(&other[2])])
}

/// True when no two distances have strictly opposite signs and at least one
/// is non-zero (all-zero means coplanar, which is never rejected).
#[inline]
fn one_sided(d: &[f64; 3]) -> bool {
    let pos = d.iter().any(|&x| x > 0.0);
    let neg = d.iter().any(|&x| x < 0.0);
    pos != neg
}
