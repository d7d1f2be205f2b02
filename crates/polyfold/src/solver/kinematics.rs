//! Forward kinematics: per-edge angle constraints and chain propagation.
//!
//! Algorithm (one `solve` call)
//! 1. Rebuild the undirected panel adjacency from the assembly's bonds and
//!    drop cached chain plans.
//! 2. Each round: push every active constraint's target into its current
//!    angle, then propagate every active `Chain` constraint.
//! 3. A round with no angle change and no vertex movement converges.
//!
//! Chain propagation
//! - BFS from the root panel (depth cap `SolverCfg::max_chain_depth`, a panel
//!   is visited once at its shortest depth). Members are processed in
//!   `(depth, id)` order.
//! - Each member rotates about its own edge of the bond that joins it
//!   directly to the root. Members without such a bond are skipped.
//! - The solver records the angle it last applied per `(constraint, member)`
//!   and rotates only by the difference, so re-solving at convergence moves
//!   nothing.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use nalgebra::Vector3;

use super::records::{ConstraintRecord, ImportError};
use super::types::{ConstraintMode, HingeConstraint, HingeKey, DEFAULT_MAX_ITERATIONS};
use crate::assembly::{Assembly, PolyformId};
use crate::geom3::cfg::ANGLE_EPS;
use crate::geom3::rotate_points_about_axis;

#[derive(Clone, Copy, Debug)]
pub struct SolverCfg {
    /// BFS depth cap for chain propagation; bounds work on cyclic bond graphs.
    pub max_chain_depth: usize,
}

impl Default for SolverCfg {
    fn default() -> Self {
        Self {
            max_chain_depth: 50,
        }
    }
}

/// One panel reached by a chain BFS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainMember {
    pub poly: PolyformId,
    pub depth: usize,
    /// Member-side edge of the bond joining it directly to the root.
    pub root_edge: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ForwardKinematics {
    cfg: SolverCfg,
    constraints: BTreeMap<HingeKey, HingeConstraint>,
    adjacency: BTreeMap<PolyformId, BTreeSet<PolyformId>>,
    /// Root panel → BFS members (root excluded). Cleared on `set_angle` and
    /// at the start of every `solve`.
    chain_plans: HashMap<PolyformId, Vec<ChainMember>>,
    /// `(constraint, member)` → angle already applied to the member.
    applied: HashMap<(HingeKey, PolyformId), f64>,
}

impl ForwardKinematics {
    pub fn new(cfg: SolverCfg) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    #[inline]
    pub fn cfg(&self) -> &SolverCfg {
        &self.cfg
    }

    /// Insert or replace by key. The range and angles are normalized first.
    pub fn add_constraint(&mut self, mut constraint: HingeConstraint) {
        constraint.normalize();
        self.constraints.insert(constraint.key.clone(), constraint);
    }

    /// Get-or-insert a default constraint on the edge.
    fn entry(&mut self, key: HingeKey) -> &mut HingeConstraint {
        self.constraints
            .entry(key)
            .or_insert_with_key(|k| HingeConstraint::new(k.clone()))
    }

    /// Clamp `angle` into the edge's range and make it current and target.
    pub fn set_angle(&mut self, poly: impl Into<PolyformId>, edge: usize, angle: f64) {
        self.entry(HingeKey::new(poly, edge)).set_target(angle);
        self.chain_plans.clear();
    }

    pub fn set_mode(&mut self, poly: impl Into<PolyformId>, edge: usize, mode: ConstraintMode) {
        self.entry(HingeKey::new(poly, edge)).mode = mode;
    }

    /// Soft enable/disable; constraints are never removed by the solver.
    pub fn set_active(&mut self, poly: impl Into<PolyformId>, edge: usize, active: bool) {
        self.entry(HingeKey::new(poly, edge)).active = active;
    }

    pub fn get_angle(&self, poly: impl Into<PolyformId>, edge: usize) -> Option<f64> {
        self.constraints
            .get(&HingeKey::new(poly, edge))
            .map(|c| c.current_angle)
    }

    #[inline]
    pub fn constraint(&self, key: &HingeKey) -> Option<&HingeConstraint> {
        self.constraints.get(key)
    }

    /// All constraints in key order.
    pub fn constraints(&self) -> impl Iterator<Item = &HingeConstraint> + '_ {
        self.constraints.values()
    }

    /// Forget which angles were already applied. Use after replacing panel
    /// geometry so the next `solve` rotates members by the full angle.
    pub fn reset_applied(&mut self) {
        self.applied.clear();
    }

    /// Run up to `max_iterations` rounds; `true` when a round changed nothing.
    pub fn solve<A: Assembly + ?Sized>(&mut self, assembly: &mut A, max_iterations: usize) -> bool {
        self.rebuild_adjacency(&*assembly);
        self.chain_plans.clear();

        let active: Vec<HingeKey> = self
            .constraints
            .values()
            .filter(|c| c.active)
            .map(|c| c.key.clone())
            .collect();
        if active.is_empty() {
            return true;
        }

        for round in 0..max_iterations {
            let mut changed = false;
            let mut moved = false;
            for key in &active {
                let Some(c) = self.constraints.get_mut(key) else {
                    continue;
                };
                if let Some(target) = c.target_angle {
                    let target = c.clamp_angle(target);
                    if target != c.current_angle {
                        c.current_angle = target;
                        changed = true;
                    }
                }
                let (mode, angle) = (c.mode, c.current_angle);
                match mode {
                    ConstraintMode::Chain => moved |= self.propagate_chain(key, angle, assembly),
                    ConstraintMode::Balanced => {
                        tracing::debug!(key = %key, "balanced mode has no propagation")
                    }
                    ConstraintMode::Absolute | ConstraintMode::Relative => {}
                }
            }
            tracing::debug!(round, changed, moved, "solve round");
            if !changed && !moved {
                return true;
            }
        }
        tracing::debug!(max_iterations, "solve did not converge");
        false
    }

    fn rebuild_adjacency<A: Assembly + ?Sized>(&mut self, assembly: &A) {
        self.adjacency.clear();
        for bond in assembly.get_bonds() {
            self.adjacency
                .entry(bond.poly1_id.clone())
                .or_default()
                .insert(bond.poly2_id.clone());
            self.adjacency
                .entry(bond.poly2_id.clone())
                .or_default()
                .insert(bond.poly1_id.clone());
        }
    }

    /// BFS members of `root` in `(depth, id)` order, computed on first use.
    fn ensure_chain_plan<A: Assembly + ?Sized>(&mut self, root: &PolyformId, assembly: &A) {
        if self.chain_plans.contains_key(root) {
            return;
        }
        let mut members = Vec::new();
        let mut seen = BTreeSet::from([root.clone()]);
        let mut queue = VecDeque::from([(root.clone(), 0usize)]);
        while let Some((poly, depth)) = queue.pop_front() {
            if depth >= self.cfg.max_chain_depth {
                continue;
            }
            let Some(neighbours) = self.adjacency.get(&poly) else {
                continue;
            };
            for next in neighbours {
                if seen.insert(next.clone()) {
                    members.push(ChainMember {
                        poly: next.clone(),
                        depth: depth + 1,
                        root_edge: assembly.find_connection_edge(root, next).map(|(_, e)| e),
                    });
                    queue.push_back((next.clone(), depth + 1));
                }
            }
        }
        members.sort_by(|a, b| (a.depth, &a.poly).cmp(&(b.depth, &b.poly)));
        self.chain_plans.insert(root.clone(), members);
    }

    /// Rotate each directly bonded member towards `angle`. Returns whether any
    /// vertex moved.
    fn propagate_chain<A: Assembly + ?Sized>(
        &mut self,
        key: &HingeKey,
        angle: f64,
        assembly: &mut A,
    ) -> bool {
        let root = &key.polyform_id;
        self.ensure_chain_plan(root, &*assembly);
        let Some(plan) = self.chain_plans.get(root) else {
            return false;
        };
        let mut moved = false;
        for member in plan {
            let Some(edge) = member.root_edge else {
                tracing::debug!(root = %root, member = %member.poly, "no direct bond to root; skipped");
                continue;
            };
            let applied = self
                .applied
                .entry((key.clone(), member.poly.clone()))
                .or_insert(0.0);
            let delta = angle - *applied;
            if delta.abs() < ANGLE_EPS {
                continue;
            }
            if rotate_panel_about_edge(assembly, &member.poly, edge, delta) {
                *applied = angle;
                moved = true;
            }
        }
        moved
    }

    /// Current angles of every constraint on a panel reachable from `root`
    /// over the adjacency built by the last `solve`.
    pub fn get_chain_angles(&self, root: &PolyformId) -> BTreeMap<HingeKey, f64> {
        let mut reach = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(poly) = queue.pop_front() {
            if !reach.insert(poly.clone()) {
                continue;
            }
            if let Some(neighbours) = self.adjacency.get(&poly) {
                queue.extend(neighbours.iter().filter(|n| !reach.contains(*n)).cloned());
            }
        }
        self.constraints
            .iter()
            .filter(|(k, _)| reach.contains(&k.polyform_id))
            .map(|(k, c)| (k.clone(), c.current_angle))
            .collect()
    }

    /// `"{poly}_{edge}"` → record, for every constraint.
    pub fn export_constraints(&self) -> BTreeMap<String, ConstraintRecord> {
        self.constraints
            .iter()
            .map(|(k, c)| (k.to_string(), ConstraintRecord::from(c)))
            .collect()
    }

    /// Add or replace constraints from records (map keys are ignored; the
    /// record's own id and edge decide the slot). All-or-nothing.
    pub fn import_constraints(
        &mut self,
        records: &BTreeMap<String, ConstraintRecord>,
    ) -> Result<usize, ImportError> {
        let parsed = records
            .values()
            .map(HingeConstraint::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let n = parsed.len();
        for c in parsed {
            self.add_constraint(c);
        }
        Ok(n)
    }
}

/// Rotate a panel (vertices and optional mesh) about its edge `edge`.
/// Missing panels and out-of-range or degenerate edges are logged no-ops.
fn rotate_panel_about_edge<A: Assembly + ?Sized>(
    assembly: &mut A,
    poly_id: &PolyformId,
    edge: usize,
    angle: f64,
) -> bool {
    let Some(poly) = assembly.get_polyform_mut(poly_id) else {
        tracing::warn!(poly = %poly_id, "constraint apply: polyform not found");
        return false;
    };
    let Some((pivot, end)) = poly.edge(edge) else {
        tracing::warn!(
            poly = %poly_id,
            edge,
            sides = poly.sides(),
            "constraint apply: edge out of range"
        );
        return false;
    };
    let axis = end - pivot;
    if !rotate_points_about_axis(&mut poly.vertices, pivot, axis, angle) {
        tracing::debug!(poly = %poly_id, edge, "constraint apply: degenerate edge");
        return false;
    }
    if let Some(mesh) = poly.mesh.as_mut() {
        rotate_points_about_axis(&mut mesh.vertices, pivot, axis, angle);
        rotate_points_about_axis(&mut mesh.normals, Vector3::zeros(), axis, angle);
    }
    true
}

/// Solve with the default iteration budget.
pub fn apply_constraints<A: Assembly + ?Sized>(
    assembly: &mut A,
    solver: &mut ForwardKinematics,
) -> bool {
    solver.solve(assembly, DEFAULT_MAX_ITERATIONS)
}
