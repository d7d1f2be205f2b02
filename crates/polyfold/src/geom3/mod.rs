//! 3D geometry primitives shared by the solver, hinge manager and collision code.
//!
//! Purpose
//! - Closed-form rigid rotation about an arbitrary axis (Rodrigues), both as an
//!   in-place point map and as a homogeneous 4×4 transform.
//! - Narrow-phase predicates (Möller–Trumbore ray test, conservative
//!   triangle–triangle test).
//! - Small triangle-mesh container with normals, prism extrusion and transforms.
//! - Replayable random triangle soups for tests and benches.
//!
//! Conventions
//! - Points and directions are `nalgebra::Vector3<f64>`.
//! - Degenerate input (short axis, zero-area triangle) is a no-op / `false` /
//!   `None`; nothing here panics on geometry.
//!
//! Code cross-refs: `solver::ForwardKinematics`, `hinge::HingeManager`,
//! `collision::TriangleCollisionDetector`.

pub(crate) mod cfg;
pub mod intersect;
pub mod mesh;
pub mod rand;
pub mod rotation;

pub use intersect::{ray_triangle_intersection, triangles_intersect, Triangle};
pub use mesh::{
    compute_face_normals, compute_vertex_normals, extrude_polygon, polygon_normal, transform_mesh,
    MeshData,
};
pub use rotation::{
    rotate_about_axis, rotate_points_about_axis, rotation_about_pivot, rotation_matrix_axis_angle,
    unit_axis,
};
