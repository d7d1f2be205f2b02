//! Geometry core for folding flat polygon nets into 3D shells.
//!
//! Modules
//! - `geom3`: rigid rotations, narrow-phase predicates, triangle meshes.
//! - `assembly`: panels, bonds and the `Assembly` collaborator trait.
//! - `hinge`: hinges derived from bonds, fold transforms, hinge paths.
//! - `solver`: per-edge angle constraints and chain propagation.
//! - `collision`: BVH-accelerated mesh collision and assembly validation.
//!
//! API Policy
//! - The crate serves the `polyfold` CLI and in-tree callers. There is no
//!   stable public API; `api` is the curated surface and may change.

pub mod api;
pub mod assembly;
pub mod collision;
pub mod geom3;
pub mod hinge;
pub mod solver;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use nalgebra::{Matrix4 as Mat4, Vector3 as Vec3};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::assembly::{Assembly, Bond, MemoryAssembly, Polyform, PolyformId};
    pub use crate::collision::{CollisionValidator, TriangleCollisionDetector, ValidatorCfg};
    pub use crate::geom3::MeshData;
    pub use crate::hinge::{Hinge, HingeCfg, HingeId, HingeManager};
    pub use crate::solver::{ConstraintMode, ForwardKinematics, HingeConstraint, HingeKey};
    pub use nalgebra::{Matrix4 as Mat4, Vector3 as Vec3};
}
