//! Curated internal API (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for the CLI,
//!   benches and demos. Breaking changes are allowed and expected.
//! - Prefer these re-exports for consistency across callers.

// Geometry
pub use crate::geom3::rand::{draw_triangle_soup, ReplayToken as SoupReplay, SoupCfg};
pub use crate::geom3::{
    extrude_polygon, polygon_normal, ray_triangle_intersection, rotate_points_about_axis,
    rotation_about_pivot, transform_mesh, triangles_intersect, MeshData, Triangle,
};
// Assembly model
pub use crate::assembly::{Assembly, Bond, MemoryAssembly, Polyform, PolyformId};
// Hinges
pub use crate::hinge::{Hinge, HingeCfg, HingeGraph, HingeId, HingeManager};
// Constraints and kinematics
pub use crate::solver::{
    apply_constraints, ConstraintMode, ConstraintRecord, ForwardKinematics, HingeConstraint,
    HingeKey, ImportError, SolverCfg, DEFAULT_MAX_ITERATIONS,
};
// Collision
pub use crate::collision::{
    Aabb, BvhCfg, CollisionKind, CollisionReport, CollisionValidator, FoldRejection, RayHit,
    RaycastCfg, Severity, TriangleCollisionDetector, ValidatorCfg,
};
