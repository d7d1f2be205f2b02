//! Hinges derived from assembly bonds, fold transforms, and fold-chain search.

use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::{Matrix4, Vector3};

use super::graph::HingeGraph;
use super::types::{Hinge, HingeCfg, HingeId};
use crate::assembly::{Assembly, Bond, PolyformId};
use crate::geom3::cfg::NORMAL_EPS;
use crate::geom3::{rotation_about_pivot, transform_mesh, MeshData};

#[derive(Clone, Debug, Default)]
pub struct HingeManager {
    pub graph: HingeGraph,
    pub cfg: HingeCfg,
}

impl HingeManager {
    pub fn new(cfg: HingeCfg) -> Self {
        Self {
            graph: HingeGraph::new(),
            cfg,
        }
    }

    /// Hinge whose axis is the point-wise average of the two bonded edges.
    /// Edge indices wrap around each panel.
    ///
    /// Endpoints are paired by proximity: two CCW panels sharing an edge
    /// traverse it in opposite directions, so the second edge is flipped when
    /// that brings its endpoints closer. The axis runs along the first edge.
    pub fn create_hinge_from_bond<A: Assembly + ?Sized>(
        &self,
        bond: &Bond,
        assembly: &A,
    ) -> Option<Hinge> {
        let (Some(p1), Some(p2)) = (
            assembly.get_polyform(&bond.poly1_id),
            assembly.get_polyform(&bond.poly2_id),
        ) else {
            tracing::warn!(
                poly1 = %bond.poly1_id,
                poly2 = %bond.poly2_id,
                "bond references a missing polyform"
            );
            return None;
        };
        let (s1, e1) = p1.edge_cyclic(bond.edge1_idx);
        let (mut s2, mut e2) = p2.edge_cyclic(bond.edge2_idx);
        if (s1 - e2).norm() + (e1 - s2).norm() < (s1 - s2).norm() + (e1 - e2).norm() {
            std::mem::swap(&mut s2, &mut e2);
        }
        Some(Hinge::new(
            bond.poly1_id.clone(),
            bond.edge1_idx,
            bond.poly2_id.clone(),
            bond.edge2_idx,
            (s1 + s2) * 0.5,
            (e1 + e2) * 0.5,
        ))
    }

    /// Add the bond's hinge. The returned handle is valid after any
    /// auto-compaction this call triggers.
    pub fn add_bond_as_hinge<A: Assembly + ?Sized>(
        &mut self,
        bond: &Bond,
        assembly: &A,
    ) -> Option<HingeId> {
        let hinge = self.create_hinge_from_bond(bond, assembly)?;
        let id = self.graph.add_hinge(hinge);
        if self.cfg.auto_compact && self.graph.should_compact(self.cfg.compact_threshold) {
            let remap = self.graph.compact();
            return remap.get(&id).copied();
        }
        Some(id)
    }

    /// Replace the graph with one hinge per resolvable bond.
    pub fn rebuild_from_assembly<A: Assembly + ?Sized>(&mut self, assembly: &A) {
        self.graph.clear();
        let mut added = 0usize;
        for bond in assembly.get_bonds() {
            if self.add_bond_as_hinge(bond, assembly).is_some() {
                added += 1;
            }
        }
        tracing::debug!(
            bonds = assembly.get_bonds().len(),
            hinges = added,
            "rebuilt hinge graph"
        );
    }

    /// `T(pivot) · R(axis, angle) · T(−pivot)`; pivot defaults to the axis
    /// midpoint. Identity for an inert hinge.
    pub fn compute_fold_transform(
        &self,
        hinge: &Hinge,
        angle: f64,
        pivot: Option<Vector3<f64>>,
    ) -> Matrix4<f64> {
        if hinge.axis().is_none() {
            return Matrix4::identity();
        }
        rotation_about_pivot(
            pivot.unwrap_or_else(|| hinge.midpoint()),
            hinge.axis_vector(),
            angle,
        )
    }

    pub fn apply_fold_to_mesh(&self, mesh: &MeshData, hinge: &Hinge, angle: f64) -> MeshData {
        transform_mesh(mesh, &self.compute_fold_transform(hinge, angle, None))
    }

    /// Signed rotation about the hinge axis that turns `current_normal` into
    /// `target_normal`, measured between their projections onto the plane
    /// perpendicular to the axis. Positive when `(current × target) · axis >= 0`.
    ///
    /// Returns 0 for an inert hinge or when either projection vanishes.
    pub fn compute_out_of_plane_rotation(
        &self,
        hinge: &Hinge,
        target_normal: Vector3<f64>,
        current_normal: Vector3<f64>,
    ) -> f64 {
        let Some(axis) = hinge.axis() else {
            return 0.0;
        };
        let k = axis.into_inner();
        let target = target_normal - k * target_normal.dot(&k);
        let current = current_normal - k * current_normal.dot(&k);
        if target.norm() < NORMAL_EPS || current.norm() < NORMAL_EPS {
            return 0.0;
        }
        let cross = current.cross(&target);
        let angle = cross.norm().atan2(current.dot(&target));
        if cross.dot(&k) >= 0.0 {
            angle
        } else {
            -angle
        }
    }

    /// Shortest hinge path (BFS over active hinges) from `from` to `to`.
    /// Empty when `from == to` or the panels are not connected.
    pub fn get_fold_chain(&self, from: &PolyformId, to: &PolyformId) -> Vec<HingeId> {
        if from == to {
            return Vec::new();
        }
        let mut parent: HashMap<PolyformId, (PolyformId, HingeId)> = HashMap::new();
        let mut visited: HashSet<PolyformId> = HashSet::from([from.clone()]);
        let mut queue = VecDeque::from([from.clone()]);
        while let Some(current) = queue.pop_front() {
            for (id, hinge) in self.graph.hinges_for_poly(&current) {
                if !hinge.active {
                    continue;
                }
                let Some(other) = hinge.other(&current) else {
                    continue;
                };
                if !visited.insert(other.clone()) {
                    continue;
                }
                parent.insert(other.clone(), (current.clone(), id));
                if other == to {
                    return unwind(&parent, from, to);
                }
                queue.push_back(other.clone());
            }
        }
        Vec::new()
    }

    /// `get_fold_chain` resolved to hinges.
    pub fn fold_chain_hinges(&self, from: &PolyformId, to: &PolyformId) -> Vec<&Hinge> {
        self.get_fold_chain(from, to)
            .into_iter()
            .filter_map(|id| self.graph.get_hinge(id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }
}

fn unwind(
    parent: &HashMap<PolyformId, (PolyformId, HingeId)>,
    from: &PolyformId,
    to: &PolyformId,
) -> Vec<HingeId> {
    let mut path = Vec::new();
    let mut cursor = to;
    while cursor != from {
        let Some((prev, id)) = parent.get(cursor) else {
            break;
        };
        path.push(*id);
        cursor = prev;
    }
    path.reverse();
    path
}
