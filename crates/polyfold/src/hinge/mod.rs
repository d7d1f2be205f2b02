//! Fold hinges between bonded panels.
//!
//! Purpose
//! - `HingeGraph`: arena of hinges with a panel → hinge adjacency, soft
//!   removal, compaction and connected components.
//! - `HingeManager`: derives hinges from assembly bonds, builds rigid fold
//!   transforms about a hinge axis, and finds shortest hinge paths.
//!
//! Conventions
//! - Handles are `HingeId { index, generation }`. `compact()` and `clear()`
//!   start a new generation; older handles resolve to `None`.
//! - Angles are radians; positive folds follow the right-hand rule about
//!   `axis_end - axis_start`.
//! - An axis shorter than the rotation degeneracy threshold makes the hinge
//!   inert (identity transform, zero out-of-plane angle).
//!
//! Code cross-refs: `geom3::rotation_about_pivot`, `geom3::transform_mesh`.

pub mod graph;
pub mod manager;
pub mod types;

pub use graph::HingeGraph;
pub use manager::HingeManager;
pub use types::{Hinge, HingeCfg, HingeId, MIN_HINGE_LENGTH};
