use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use crate::assembly::PolyformId;

/// Iterations used by `apply_constraints` and the CLI when none are given.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// How a constraint participates in `solve()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConstraintMode {
    /// Fixed angle, no propagation.
    Absolute,
    /// Angle relative to the parent panel, no propagation.
    #[default]
    Relative,
    /// Propagate the angle to every panel bonded directly to the root.
    Chain,
    /// Reserved for energy minimisation; currently behaves like `Relative`.
    Balanced,
}

impl ConstraintMode {
    pub const ALL: [ConstraintMode; 4] = [
        ConstraintMode::Absolute,
        ConstraintMode::Relative,
        ConstraintMode::Chain,
        ConstraintMode::Balanced,
    ];

    /// Interchange name (`"CHAIN"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ConstraintMode::Absolute => "ABSOLUTE",
            ConstraintMode::Relative => "RELATIVE",
            ConstraintMode::Chain => "CHAIN",
            ConstraintMode::Balanced => "BALANCED",
        }
    }
}

impl fmt::Display for ConstraintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown constraint mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(pub String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown constraint mode: {:?}", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for ConstraintMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ParseModeError(s.to_owned()))
    }
}

/// Constraint key: a panel edge. Displays as `"{polyform_id}_{edge_idx}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HingeKey {
    pub polyform_id: PolyformId,
    pub edge_idx: usize,
}

impl HingeKey {
    pub fn new(polyform_id: impl Into<PolyformId>, edge_idx: usize) -> Self {
        Self {
            polyform_id: polyform_id.into(),
            edge_idx,
        }
    }
}

impl fmt::Display for HingeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.polyform_id, self.edge_idx)
    }
}

/// Angle limits and state for one panel edge. Angles in radians.
///
/// Invariants:
/// - `min_angle <= max_angle`
/// - `min_angle <= current_angle <= max_angle`
#[derive(Clone, Debug, PartialEq)]
pub struct HingeConstraint {
    pub key: HingeKey,
    pub min_angle: f64,
    pub max_angle: f64,
    pub current_angle: f64,
    pub target_angle: Option<f64>,
    pub active: bool,
    pub mode: ConstraintMode,
}

impl HingeConstraint {
    /// Defaults: `[0, π]`, current `π/2`, no target, active, `Relative`.
    pub fn new(key: HingeKey) -> Self {
        Self {
            key,
            min_angle: 0.0,
            max_angle: PI,
            current_angle: FRAC_PI_2,
            target_angle: None,
            active: true,
            mode: ConstraintMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ConstraintMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_range(mut self, min_angle: f64, max_angle: f64) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self.normalize();
        self
    }

    /// Clamp into `[min_angle, max_angle]`. NaN maps to `min_angle`.
    #[inline]
    pub fn clamp_angle(&self, angle: f64) -> f64 {
        angle.max(self.min_angle).min(self.max_angle)
    }

    /// Clamp `angle` and make it both the target and the current angle.
    pub fn set_target(&mut self, angle: f64) {
        let a = self.clamp_angle(angle);
        self.target_angle = Some(a);
        self.current_angle = a;
    }

    /// Restore the invariants: order the range, clamp current and target.
    pub fn normalize(&mut self) {
        if self.min_angle > self.max_angle {
            std::mem::swap(&mut self.min_angle, &mut self.max_angle);
        }
        self.current_angle = self.clamp_angle(self.current_angle);
        self.target_angle = self.target_angle.map(|t| self.clamp_angle(t));
    }
}
