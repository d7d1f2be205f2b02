//! Rigid rotation about an arbitrary axis (Rodrigues).
//!
//! Both the constraint solver (in-place vertex rotation) and the hinge manager
//! (homogeneous fold transforms) go through this module, so the two agree on
//! sign conventions: positive angles rotate counterclockwise when looking down
//! the axis towards the pivot.

use nalgebra::{Matrix4, Rotation3, Unit, Vector3};

use super::cfg::AXIS_EPS;

/// Normalize `axis`, or `None` if its length is below the degeneracy threshold.
#[inline]
pub fn unit_axis(axis: Vector3<f64>) -> Option<Unit<Vector3<f64>>> {
    let norm = axis.norm();
    if !norm.is_finite() || norm < AXIS_EPS {
        return None;
    }
    Some(Unit::new_unchecked(axis / norm))
}

/// Rotate `v` by `angle` about the line through `pivot` with direction `k`.
///
/// `v' = P + (v−P)cosθ + (k×(v−P))sinθ + k(k·(v−P))(1−cosθ)`
#[inline]
pub fn rotate_about_axis(
    v: Vector3<f64>,
    pivot: Vector3<f64>,
    k: &Unit<Vector3<f64>>,
    angle: f64,
) -> Vector3<f64> {
    let (sin_a, cos_a) = angle.sin_cos();
    let p = v - pivot;
    let k = k.as_ref();
    pivot + p * cos_a + k.cross(&p) * sin_a + k * (k.dot(&p) * (1.0 - cos_a))
}

/// Rotate all `points` in place. Returns `false` (and leaves the points
/// untouched) when `axis` is degenerate.
pub fn rotate_points_about_axis(
    points: &mut [Vector3<f64>],
    pivot: Vector3<f64>,
    axis: Vector3<f64>,
    angle: f64,
) -> bool {
    let Some(k) = unit_axis(axis) else {
        return false;
    };
    for p in points.iter_mut() {
        *p = rotate_about_axis(*p, pivot, &k, angle);
    }
    true
}

/// Homogeneous 4×4 rotation about an axis through the origin.
/// A degenerate axis yields the identity.
pub fn rotation_matrix_axis_angle(axis: Vector3<f64>, angle: f64) -> Matrix4<f64> {
    match unit_axis(axis) {
        Some(k) => Rotation3::from_axis_angle(&k, angle).to_homogeneous(),
        None => Matrix4::identity(),
    }
}

/// `T(pivot) · R(axis, angle) · T(−pivot)`.
pub fn rotation_about_pivot(pivot: Vector3<f64>, axis: Vector3<f64>, angle: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&pivot)
        * rotation_matrix_axis_angle(axis, angle)
        * Matrix4::new_translation(&(-pivot))
}
