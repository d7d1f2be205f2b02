//! Collision detection for folded panels.
//!
//! Purpose
//! - Broad phase: axis-aligned boxes and a median-split BVH per mesh.
//! - Narrow phase: conservative triangle–triangle tests (`geom3::triangles_intersect`).
//! - Assembly level: `CollisionValidator` runs self- and pairwise checks over
//!   every panel and reports or rejects folds.
//!
//! Conventions
//! - Every query builds the BVH lazily on first use. After moving mesh
//!   vertices the owner must call `build_bvh` again; the tree has no dirty flag.
//! - Tolerances: `eps` arguments widen box tests and snap near-zero plane
//!   distances. Box tests never use less than `AABB_EPS`.
//! - The narrow test may report false positives (coplanar overlapping
//!   triangles), never false negatives for properly crossing triangles.
//!   Touching contacts (a vertex or edge lying on the other triangle's plane
//!   with the rest on one side) are not reported.
//! - Meshes with out-of-range face indices get no BVH and never collide.
//!
//! Code cross-refs: `geom3::intersect`, `assembly::Assembly`.

pub mod aabb;
pub mod bvh;
pub mod detector;
pub mod types;
pub mod validator;

pub use aabb::Aabb;
pub use bvh::BvhNode;
pub use detector::TriangleCollisionDetector;
pub use types::{BvhCfg, RayHit, RaycastCfg};
pub use validator::{
    CollisionKind, CollisionReport, CollisionValidator, FoldRejection, Severity, ValidatorCfg,
};

#[cfg(test)]
mod tests;
