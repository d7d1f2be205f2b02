//! Assembly data model: panels (polyforms), bonds, and the collaborator trait.
//!
//! Purpose
//! - The engine never owns an assembly. It reads bonds and mutates panel
//!   vertices through the narrow `Assembly` trait.
//! - `MemoryAssembly` is the plain in-memory implementation used by tests, the
//!   CLI (JSON fixtures) and benches.
//!
//! Conventions
//! - Polygon edge `i` joins vertex `i` and vertex `(i + 1) % n`.
//! - Bonds are unordered: `{a, ea} ↔ {b, eb}` equals `{b, eb} ↔ {a, ea}`.

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geom3::MeshData;

/// Panel identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolyformId(pub String);

impl PolyformId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PolyformId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PolyformId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PolyformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single panel: ordered cyclic vertex loop plus an optional thin-solid mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyform {
    pub id: PolyformId,
    pub vertices: Vec<Vector3<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshData>,
}

impl Polyform {
    pub fn new(id: impl Into<PolyformId>, vertices: Vec<Vector3<f64>>) -> Self {
        Self {
            id: id.into(),
            vertices,
            mesh: None,
        }
    }

    #[inline]
    pub fn sides(&self) -> usize {
        self.vertices.len()
    }

    /// Endpoints of edge `idx`, or `None` if `idx` is out of range.
    pub fn edge(&self, idx: usize) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let n = self.vertices.len();
        if idx >= n {
            return None;
        }
        Some((self.vertices[idx], self.vertices[(idx + 1) % n]))
    }

    /// Endpoints of edge `idx % n`; zeros for panels with fewer than two vertices.
    pub fn edge_cyclic(&self, idx: usize) -> (Vector3<f64>, Vector3<f64>) {
        let n = self.vertices.len();
        if n < 2 {
            return (Vector3::zeros(), Vector3::zeros());
        }
        let i = idx % n;
        (self.vertices[i], self.vertices[(i + 1) % n])
    }
}

/// Declared edge-to-edge joint between two panels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub poly1_id: PolyformId,
    pub edge1_idx: usize,
    pub poly2_id: PolyformId,
    pub edge2_idx: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_angle: Option<f64>,
}

impl Bond {
    pub fn new(
        poly1: impl Into<PolyformId>,
        edge1: usize,
        poly2: impl Into<PolyformId>,
        edge2: usize,
    ) -> Self {
        Self {
            poly1_id: poly1.into(),
            edge1_idx: edge1,
            poly2_id: poly2.into(),
            edge2_idx: edge2,
            fold_angle: None,
        }
    }

    /// If this bond joins `a` and `b` (either order), return `(edge on a, edge on b)`.
    pub fn edges_between(&self, a: &PolyformId, b: &PolyformId) -> Option<(usize, usize)> {
        if &self.poly1_id == a && &self.poly2_id == b {
            Some((self.edge1_idx, self.edge2_idx))
        } else if &self.poly2_id == a && &self.poly1_id == b {
            Some((self.edge2_idx, self.edge1_idx))
        } else {
            None
        }
    }

    #[inline]
    pub fn involves(&self, id: &PolyformId) -> bool {
        &self.poly1_id == id || &self.poly2_id == id
    }
}

/// Narrow view of the external assembly collaborator.
pub trait Assembly {
    fn get_polyform(&self, id: &PolyformId) -> Option<&Polyform>;
    fn get_polyform_mut(&mut self, id: &PolyformId) -> Option<&mut Polyform>;
    fn get_all_polyforms(&self) -> Vec<&Polyform>;
    fn get_bonds(&self) -> &[Bond];

    fn polyform_ids(&self) -> Vec<PolyformId> {
        self.get_all_polyforms()
            .into_iter()
            .map(|p| p.id.clone())
            .collect()
    }

    /// First bond joining `a` and `b` directly, as `(edge on a, edge on b)`.
    fn find_connection_edge(&self, a: &PolyformId, b: &PolyformId) -> Option<(usize, usize)> {
        self.get_bonds().iter().find_map(|bond| bond.edges_between(a, b))
    }
}

/// Plain in-memory assembly; the JSON shape is `{ "polyforms": [...], "bonds": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryAssembly {
    #[serde(default)]
    pub polyforms: Vec<Polyform>,
    #[serde(default)]
    pub bonds: Vec<Bond>,
}

impl MemoryAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id.
    pub fn add_polyform(&mut self, polyform: Polyform) {
        match self.polyforms.iter_mut().find(|p| p.id == polyform.id) {
            Some(slot) => *slot = polyform,
            None => self.polyforms.push(polyform),
        }
    }

    pub fn add_bond(&mut self, bond: Bond) {
        self.bonds.push(bond);
    }
}

impl Assembly for MemoryAssembly {
    fn get_polyform(&self, id: &PolyformId) -> Option<&Polyform> {
        self.polyforms.iter().find(|p| &p.id == id)
    }

    fn get_polyform_mut(&mut self, id: &PolyformId) -> Option<&mut Polyform> {
        self.polyforms.iter_mut().find(|p| &p.id == id)
    }

    fn get_all_polyforms(&self) -> Vec<&Polyform> {
        self.polyforms.iter().collect()
    }

    fn get_bonds(&self) -> &[Bond] {
        &self.bonds
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
