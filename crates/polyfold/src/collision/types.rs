//! Configuration and result types for collision queries.

use nalgebra::Vector3;

/// Tolerance for BVH node overlap tests during traversal.
pub(crate) const AABB_EPS: f64 = 1e-6;

/// BVH build limits.
#[derive(Clone, Copy, Debug)]
pub struct BvhCfg {
    pub max_triangles: usize,
    pub max_depth: usize,
}

impl Default for BvhCfg {
    fn default() -> Self {
        Self {
            max_triangles: 4,
            max_depth: 20,
        }
    }
}

/// Ray-query bounds: the candidate box spans `[origin, origin + dir·t_max]`,
/// padded by `pad` on every side.
#[derive(Clone, Copy, Debug)]
pub struct RaycastCfg {
    pub t_max: f64,
    pub pad: f64,
}

impl Default for RaycastCfg {
    fn default() -> Self {
        Self {
            t_max: 10_000.0,
            pad: 0.1,
        }
    }
}

/// Nearest ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    pub point: Vector3<f64>,
    pub face_id: usize,
}
