//! Flat export/import shape for constraints.
//!
//! The record is the interchange contract with UI and optimizer callers:
//! `{ "A_0": { "polyform_id": "A", "edge_idx": 0, "min_angle": 0.0, ...,
//! "mode": "CHAIN" } }`. Missing fields take the constraint defaults.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{ConstraintMode, HingeConstraint, HingeKey, ParseModeError};
use crate::assembly::PolyformId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub polyform_id: PolyformId,
    pub edge_idx: usize,
    #[serde(default)]
    pub min_angle: f64,
    #[serde(default = "default_max_angle")]
    pub max_angle: f64,
    #[serde(default = "default_current_angle")]
    pub current_angle: f64,
    #[serde(default)]
    pub target_angle: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_max_angle() -> f64 {
    PI
}

fn default_current_angle() -> f64 {
    FRAC_PI_2
}

fn default_active() -> bool {
    true
}

fn default_mode() -> String {
    ConstraintMode::default().name().to_owned()
}

impl From<&HingeConstraint> for ConstraintRecord {
    fn from(c: &HingeConstraint) -> Self {
        Self {
            polyform_id: c.key.polyform_id.clone(),
            edge_idx: c.key.edge_idx,
            min_angle: c.min_angle,
            max_angle: c.max_angle,
            current_angle: c.current_angle,
            target_angle: c.target_angle,
            active: c.active,
            mode: c.mode.name().to_owned(),
        }
    }
}

impl TryFrom<&ConstraintRecord> for HingeConstraint {
    type Error = ImportError;

    fn try_from(r: &ConstraintRecord) -> Result<Self, Self::Error> {
        let mode = r.mode.parse::<ConstraintMode>().map_err(|e| ImportError::UnknownMode {
            key: HingeKey::new(r.polyform_id.clone(), r.edge_idx).to_string(),
            source: e,
        })?;
        let mut c = HingeConstraint {
            key: HingeKey::new(r.polyform_id.clone(), r.edge_idx),
            min_angle: r.min_angle,
            max_angle: r.max_angle,
            current_angle: r.current_angle,
            target_angle: r.target_angle,
            active: r.active,
            mode,
        };
        c.normalize();
        Ok(c)
    }
}

/// Import failure. Nothing is imported when any record fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    UnknownMode { key: String, source: ParseModeError },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMode { key, source } => write!(f, "constraint {key}: {source}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownMode { source, .. } => Some(source),
        }
    }
}
