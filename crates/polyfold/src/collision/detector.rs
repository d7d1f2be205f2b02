//! BVH-accelerated collision, self-intersection and ray queries on one mesh.

use nalgebra::Vector3;

use super::aabb::Aabb;
use super::bvh::BvhNode;
use super::types::{BvhCfg, RayHit, RaycastCfg, AABB_EPS};
use crate::geom3::{ray_triangle_intersection, triangles_intersect, MeshData};

/// Collision queries over a single triangle mesh.
///
/// Invariants:
/// - `bvh` (when present) was built from the current `mesh` unless the caller
///   mutated vertices through `mesh_mut` without calling `build_bvh` again.
///   Queries on a stale tree return plausible but wrong answers.
#[derive(Clone, Debug)]
pub struct TriangleCollisionDetector {
    mesh: MeshData,
    cfg: BvhCfg,
    ray_cfg: RaycastCfg,
    bvh: Option<BvhNode>,
    narrow_tests: u64,
}

impl TriangleCollisionDetector {
    pub fn new(mesh: MeshData) -> Self {
        Self::with_cfg(mesh, BvhCfg::default())
    }

    pub fn with_cfg(mesh: MeshData, cfg: BvhCfg) -> Self {
        Self {
            mesh,
            cfg,
            ray_cfg: RaycastCfg::default(),
            bvh: None,
            narrow_tests: 0,
        }
    }

    pub fn with_raycast_cfg(mut self, ray_cfg: RaycastCfg) -> Self {
        self.ray_cfg = ray_cfg;
        self
    }

    #[inline]
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    /// Mutable access to the mesh. The BVH is not invalidated; call
    /// `build_bvh` after moving vertices.
    #[inline]
    pub fn mesh_mut(&mut self) -> &mut MeshData {
        &mut self.mesh
    }

    #[inline]
    pub fn bvh(&self) -> Option<&BvhNode> {
        self.bvh.as_ref()
    }

    /// (Re)build the tree over all current faces. An empty mesh, or one with
    /// an out-of-range face index, has no tree and every query misses.
    pub fn build_bvh(&mut self) {
        if !self.mesh.faces_in_range() {
            tracing::warn!(
                vertices = self.mesh.vertices.len(),
                faces = self.mesh.faces.len(),
                "mesh has out-of-range face indices; no BVH built"
            );
            self.bvh = None;
            return;
        }
        let all: Vec<usize> = (0..self.mesh.faces.len()).collect();
        self.bvh = BvhNode::build(&self.mesh, all, &self.cfg);
    }

    /// Build on first use.
    pub fn ensure_bvh(&mut self) -> Option<&BvhNode> {
        if self.bvh.is_none() {
            self.build_bvh();
        }
        self.bvh.as_ref()
    }

    /// Number of exact triangle–triangle tests run since the last reset.
    #[inline]
    pub fn narrow_phase_tests(&self) -> u64 {
        self.narrow_tests
    }

    pub fn reset_counters(&mut self) {
        self.narrow_tests = 0;
    }

    /// True if any triangle of `self` intersects any triangle of `other`.
    ///
    /// Broad phase: root boxes, then one BVH query per own triangle. Each
    /// candidate pair must also have overlapping triangle boxes before the
    /// narrow test runs, which keeps the result symmetric in its arguments.
    pub fn check_collision(&mut self, other: &mut TriangleCollisionDetector, eps: f64) -> bool {
        self.ensure_bvh();
        other.ensure_bvh();
        let (Some(mine), Some(theirs)) = (self.bvh.as_ref(), other.bvh.as_ref()) else {
            return false;
        };
        let pad = eps.max(AABB_EPS);
        if !mine.aabb().intersects(theirs.aabb(), pad) {
            return false;
        }

        let mut candidates = Vec::new();
        for i in 0..self.mesh.faces.len() {
            let tri = self.mesh.triangle(i);
            let tri_box = Aabb::from_triangle(&tri);
            candidates.clear();
            theirs.query(&tri_box.padded(pad), &mut candidates);
            for &j in &candidates {
                let other_tri = other.mesh.triangle(j);
                if !tri_box.intersects(&Aabb::from_triangle(&other_tri), pad) {
                    continue;
                }
                self.narrow_tests += 1;
                if triangles_intersect(&tri, &other_tri, eps) {
                    return true;
                }
            }
        }
        false
    }

    /// All pairs `i < j` that share no vertex index; adjacent faces touch by
    /// construction and are never reported.
    pub fn check_self_intersection(&mut self, eps: f64) -> bool {
        if self.ensure_bvh().is_none() {
            return false;
        }
        let pad = eps.max(AABB_EPS);
        let faces = &self.mesh.faces;
        let boxes: Vec<Aabb> = (0..faces.len())
            .map(|f| Aabb::from_triangle(&self.mesh.triangle(f)))
            .collect();
        for i in 0..faces.len() {
            for j in i + 1..faces.len() {
                if faces[i].iter().any(|v| faces[j].contains(v)) {
                    continue;
                }
                if !boxes[i].intersects(&boxes[j], pad) {
                    continue;
                }
                self.narrow_tests += 1;
                if triangles_intersect(&self.mesh.triangle(i), &self.mesh.triangle(j), eps) {
                    return true;
                }
            }
        }
        false
    }

    /// Nearest hit with positive ray parameter. `direction` should be unit
    /// length for `distance` to be a Euclidean distance.
    pub fn raycast(
        &mut self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        eps: f64,
    ) -> Option<RayHit> {
        self.ensure_bvh();
        let bvh = self.bvh.as_ref()?;
        let far = origin + direction * self.ray_cfg.t_max;
        let ray_box = Aabb::new(origin.inf(&far), origin.sup(&far)).padded(self.ray_cfg.pad);
        let mut candidates = Vec::new();
        bvh.query(&ray_box, &mut candidates);

        let mut best: Option<RayHit> = None;
        for face_id in candidates {
            let tri = self.mesh.triangle(face_id);
            let Some(t) = ray_triangle_intersection(origin, direction, &tri, eps) else {
                continue;
            };
            if best.map_or(true, |b| t < b.distance) {
                best = Some(RayHit {
                    distance: t,
                    point: origin + direction * t,
                    face_id,
                });
            }
        }
        best
    }
}
