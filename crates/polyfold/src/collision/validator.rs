//! Assembly-level validation: self-intersection and pairwise panel collisions.
//!
//! Each panel gets a `TriangleCollisionDetector` over its own mesh, or over a
//! thin prism extruded from its vertex loop when it has none. Detectors are
//! kept in a bounded LRU cache keyed by panel id. Each entry is stamped with a
//! fingerprint of the vertices it was built from, so a panel moved by the
//! solver gets a fresh detector on its next lookup.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::detector::TriangleCollisionDetector;
use crate::assembly::{Assembly, Polyform, PolyformId};
use crate::geom3::extrude_polygon;

#[derive(Clone, Copy, Debug)]
pub struct ValidatorCfg {
    pub epsilon: f64,
    pub max_cache_size: usize,
    /// Prism thickness used for panels without their own mesh.
    pub thickness: f64,
    /// Bonded neighbours share an edge; skip them in pairwise checks.
    pub skip_bonded: bool,
}

impl Default for ValidatorCfg {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            max_cache_size: 50,
            thickness: 0.1,
            skip_bonded: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionKind {
    SelfIntersection,
    PairCollision,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionReport {
    pub kind: CollisionKind,
    pub poly1_id: PolyformId,
    pub poly2_id: Option<PolyformId>,
    pub severity: Severity,
    pub message: String,
}

/// Why a fold was rejected by `validate_fold_operation`.
#[derive(Debug, Clone, PartialEq)]
pub enum FoldRejection {
    MissingPolyform(PolyformId),
    SelfIntersection(PolyformId),
    Collision { poly: PolyformId, other: PolyformId },
}

impl fmt::Display for FoldRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPolyform(id) => write!(f, "polyform {id} not found"),
            Self::SelfIntersection(id) => {
                write!(f, "fold would cause self-intersection in {id}")
            }
            Self::Collision { poly, other } => write!(f, "fold would collide {poly} with {other}"),
        }
    }
}

impl std::error::Error for FoldRejection {}

#[derive(Debug)]
struct CachedDetector {
    fingerprint: u64,
    detector: TriangleCollisionDetector,
}

#[derive(Debug, Default)]
pub struct CollisionValidator {
    cfg: ValidatorCfg,
    cache: HashMap<PolyformId, CachedDetector>,
    lru: VecDeque<PolyformId>,
}

impl CollisionValidator {
    pub fn new(cfg: ValidatorCfg) -> Self {
        Self {
            cfg,
            cache: HashMap::new(),
            lru: VecDeque::new(),
        }
    }

    #[inline]
    pub fn cfg(&self) -> &ValidatorCfg {
        &self.cfg
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.lru.clear();
    }

    pub fn invalidate(&mut self, id: &PolyformId) {
        self.cache.remove(id);
        self.lru.retain(|x| x != id);
    }

    #[inline]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Detector for `poly`, building (and caching) it if needed. `None` when
    /// the panel has no usable surface (fewer than 3 vertices).
    pub fn get_detector(&mut self, poly: &Polyform) -> Option<&mut TriangleCollisionDetector> {
        let entry = self.take_detector(poly)?;
        self.put_back(poly.id.clone(), entry);
        self.cache.get_mut(&poly.id).map(|c| &mut c.detector)
    }

    pub fn check_self_intersection(&mut self, poly: &Polyform) -> bool {
        let eps = self.cfg.epsilon;
        match self.get_detector(poly) {
            Some(d) => d.check_self_intersection(eps),
            None => false,
        }
    }

    pub fn check_pair_collision(&mut self, p1: &Polyform, p2: &Polyform) -> bool {
        if p1.id == p2.id {
            return false;
        }
        let eps = self.cfg.epsilon;
        let Some(mut first) = self.take_detector(p1) else {
            return false;
        };
        let hit = match self.get_detector(p2) {
            Some(second) => first.detector.check_collision(second, eps),
            None => false,
        };
        self.put_back(p1.id.clone(), first);
        hit
    }

    /// Self-intersections (errors) followed by pairwise collisions (warnings).
    pub fn check_assembly_collisions<A: Assembly + ?Sized>(
        &mut self,
        assembly: &A,
    ) -> Vec<CollisionReport> {
        let polys = assembly.get_all_polyforms();
        let mut reports = Vec::new();
        for poly in &polys {
            if self.check_self_intersection(poly) {
                tracing::warn!(poly = %poly.id, "self-intersection detected");
                reports.push(CollisionReport {
                    kind: CollisionKind::SelfIntersection,
                    poly1_id: poly.id.clone(),
                    poly2_id: None,
                    severity: Severity::Error,
                    message: format!("Polyform {} has self-intersecting geometry", poly.id),
                });
            }
        }
        for (i, p1) in polys.iter().enumerate() {
            for p2 in &polys[i + 1..] {
                if self.cfg.skip_bonded && bonded(assembly, &p1.id, &p2.id) {
                    continue;
                }
                if self.check_pair_collision(p1, p2) {
                    tracing::warn!(poly1 = %p1.id, poly2 = %p2.id, "collision detected");
                    reports.push(CollisionReport {
                        kind: CollisionKind::PairCollision,
                        poly1_id: p1.id.clone(),
                        poly2_id: Some(p2.id.clone()),
                        severity: Severity::Warning,
                        message: format!("Collision between {} and {}", p1.id, p2.id),
                    });
                }
            }
        }
        reports
    }

    /// Check one panel (typically just folded) against itself and every other panel.
    pub fn validate_fold_operation<A: Assembly + ?Sized>(
        &mut self,
        assembly: &A,
        poly_id: &PolyformId,
    ) -> Result<(), FoldRejection> {
        let poly = assembly
            .get_polyform(poly_id)
            .ok_or_else(|| FoldRejection::MissingPolyform(poly_id.clone()))?;
        if self.check_self_intersection(poly) {
            return Err(FoldRejection::SelfIntersection(poly_id.clone()));
        }
        for other in assembly.get_all_polyforms() {
            if &other.id == poly_id {
                continue;
            }
            if self.cfg.skip_bonded && bonded(assembly, poly_id, &other.id) {
                continue;
            }
            if self.check_pair_collision(poly, other) {
                return Err(FoldRejection::Collision {
                    poly: poly_id.clone(),
                    other: other.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Human-readable summary of `check_assembly_collisions`.
    pub fn collision_report<A: Assembly + ?Sized>(&mut self, assembly: &A) -> String {
        let reports = self.check_assembly_collisions(assembly);
        if reports.is_empty() {
            return "Assembly is collision-free".to_owned();
        }
        let mut lines = vec!["Collision report:".to_owned()];
        for (kind, title) in [
            (CollisionKind::SelfIntersection, "Self-intersections"),
            (CollisionKind::PairCollision, "Collisions"),
        ] {
            let group: Vec<_> = reports.iter().filter(|r| r.kind == kind).collect();
            if group.is_empty() {
                continue;
            }
            lines.push(format!("{title} ({}):", group.len()));
            lines.extend(group.iter().map(|r| format!("  - {}", r.message)));
        }
        lines.join("\n")
    }

    /// Remove the cached detector for `poly` (or build one). Stale entries
    /// (vertex fingerprint changed) are rebuilt.
    fn take_detector(&mut self, poly: &Polyform) -> Option<CachedDetector> {
        let fingerprint = vertex_fingerprint(poly);
        if let Some(cached) = self.cache.remove(&poly.id) {
            self.lru.retain(|x| x != &poly.id);
            if cached.fingerprint == fingerprint {
                return Some(cached);
            }
            tracing::debug!(poly = %poly.id, "rebuilding stale collision detector");
        }
        let mesh = match &poly.mesh {
            Some(mesh) => mesh.clone(),
            None => extrude_polygon(&poly.vertices, self.cfg.thickness),
        };
        if mesh.is_empty() {
            return None;
        }
        if !mesh.faces_in_range() {
            tracing::warn!(poly = %poly.id, "mesh has out-of-range face indices; treated as no mesh");
            return None;
        }
        let mut detector = TriangleCollisionDetector::new(mesh);
        detector.build_bvh();
        Some(CachedDetector {
            fingerprint,
            detector,
        })
    }

    fn put_back(&mut self, id: PolyformId, entry: CachedDetector) {
        self.lru.retain(|x| x != &id);
        self.lru.push_back(id.clone());
        self.cache.insert(id, entry);
        while self.cache.len() > self.cfg.max_cache_size.max(1) {
            let Some(oldest) = self.lru.pop_front() else {
                break;
            };
            tracing::debug!(poly = %oldest, "evicting collision detector");
            self.cache.remove(&oldest);
        }
    }
}

fn bonded<A: Assembly + ?Sized>(assembly: &A, a: &PolyformId, b: &PolyformId) -> bool {
    assembly.find_connection_edge(a, b).is_some()
}

/// Hash of the exact vertex (and mesh vertex) bit patterns.
fn vertex_fingerprint(poly: &Polyform) -> u64 {
    let mut h = DefaultHasher::new();
    let mut feed = |v: &nalgebra::Vector3<f64>| {
        for c in v.iter() {
            c.to_bits().hash(&mut h);
        }
    };
    poly.vertices.iter().for_each(&mut feed);
    if let Some(mesh) = &poly.mesh {
        mesh.vertices.iter().for_each(&mut feed);
        mesh.faces.hash(&mut h);
    }
    h.finish()
}
