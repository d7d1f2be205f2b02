use std::fmt;

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::assembly::PolyformId;
use crate::geom3::unit_axis;

/// Minimum axis length for `Hinge::is_valid`.
pub const MIN_HINGE_LENGTH: f64 = 1e-6;

/// Fold line between two bonded panels.
///
/// Invariants:
/// - `axis()` is `None` when `axis_end - axis_start` is shorter than the
///   rotation degeneracy threshold; such a hinge is inert and every fold about
///   it is the identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hinge {
    pub poly1_id: PolyformId,
    pub edge1_idx: usize,
    pub poly2_id: PolyformId,
    pub edge2_idx: usize,
    pub axis_start: Vector3<f64>,
    pub axis_end: Vector3<f64>,
    /// Radians.
    #[serde(default)]
    pub fold_angle: f64,
    #[serde(default = "active_default")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}

impl Hinge {
    pub fn new(
        poly1_id: impl Into<PolyformId>,
        edge1_idx: usize,
        poly2_id: impl Into<PolyformId>,
        edge2_idx: usize,
        axis_start: Vector3<f64>,
        axis_end: Vector3<f64>,
    ) -> Self {
        Self {
            poly1_id: poly1_id.into(),
            edge1_idx,
            poly2_id: poly2_id.into(),
            edge2_idx,
            axis_start,
            axis_end,
            fold_angle: 0.0,
            active: true,
        }
    }

    #[inline]
    pub fn axis_vector(&self) -> Vector3<f64> {
        self.axis_end - self.axis_start
    }

    #[inline]
    pub fn axis(&self) -> Option<Unit<Vector3<f64>>> {
        unit_axis(self.axis_vector())
    }

    #[inline]
    pub fn midpoint(&self) -> Vector3<f64> {
        (self.axis_start + self.axis_end) * 0.5
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.axis_vector().norm()
    }

    /// Axis at least `min_length` long.
    #[inline]
    pub fn is_valid(&self, min_length: f64) -> bool {
        self.length() >= min_length
    }

    /// The panel on the other side of the hinge from `id`, if `id` is an endpoint.
    pub fn other(&self, id: &PolyformId) -> Option<&PolyformId> {
        if &self.poly1_id == id {
            Some(&self.poly2_id)
        } else if &self.poly2_id == id {
            Some(&self.poly1_id)
        } else {
            None
        }
    }
}

/// Generation-tagged handle into a `HingeGraph`.
///
/// A handle is only valid for the graph generation it was issued in;
/// `compact()` and `clear()` start a new generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HingeId {
    pub index: usize,
    pub generation: u32,
}

impl fmt::Display for HingeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Hinge manager knobs.
#[derive(Clone, Copy, Debug)]
pub struct HingeCfg {
    /// Compact the graph after `add_bond_as_hinge` when worthwhile.
    pub auto_compact: bool,
    /// Inactive fraction above which compaction is worthwhile.
    pub compact_threshold: f64,
}

impl Default for HingeCfg {
    fn default() -> Self {
        Self {
            auto_compact: true,
            compact_threshold: 0.5,
        }
    }
}
