//! Hinge-angle constraints and forward kinematics over an assembly's bond graph.
//!
//! Purpose
//! - Own one `HingeConstraint` per panel edge (`HingeKey`), created on first
//!   `set_angle`, clamped into its `[min, max]` range.
//! - `ForwardKinematics::solve` pushes targets into current angles and folds
//!   the panels bonded to a `Chain` constraint's root in place.
//! - `export_constraints` / `import_constraints` define the flat record shape
//!   shared with callers.
//!
//! Conventions
//! - Angles are radians.
//! - Missing panels and out-of-range edges are logged (`tracing::warn!`) and
//!   skipped; `solve` only reports convergence.
//!
//! Code cross-refs: `geom3::rotate_points_about_axis`, `assembly::Assembly`.

pub mod kinematics;
pub mod records;
pub mod types;

pub use kinematics::{apply_constraints, ChainMember, ForwardKinematics, SolverCfg};
pub use records::{ConstraintRecord, ImportError};
pub use types::{
    ConstraintMode, HingeConstraint, HingeKey, ParseModeError, DEFAULT_MAX_ITERATIONS,
};
