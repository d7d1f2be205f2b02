use super::*;
use crate::assembly::fixtures::{strip, unit_square};
use crate::assembly::{MemoryAssembly, Polyform, PolyformId};
use crate::geom3::rand::{draw_triangle_soup, ReplayToken, SoupCfg};
use crate::geom3::{extrude_polygon, MeshData};
use nalgebra::{vector, Vector3};

const EPS: f64 = 1e-6;

fn square_mesh(z: f64) -> MeshData {
    MeshData::new(
        vec![
            vector![0.0, 0.0, z],
            vector![1.0, 0.0, z],
            vector![1.0, 1.0, z],
            vector![0.0, 1.0, z],
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

/// Two triangles crossing along the segment x=0.5, z=0.
fn crossing_pair() -> (MeshData, MeshData) {
    let flat = MeshData::new(
        vec![vector![0.0, 0.0, 0.0], vector![2.0, 0.0, 0.0], vector![0.0, 2.0, 0.0]],
        vec![[0, 1, 2]],
    );
    let upright = MeshData::new(
        vec![vector![0.5, 0.5, -1.0], vector![0.5, 0.5, 1.0], vector![0.5, -1.0, 0.0]],
        vec![[0, 1, 2]],
    );
    (flat, upright)
}

fn soup(seed: u64, index: u64, offset: Vector3<f64>) -> MeshData {
    let cfg = SoupCfg {
        triangles: 40,
        extent: 2.0,
        size: 0.6,
    };
    draw_triangle_soup(cfg, offset, ReplayToken::new(seed, index))
}

// ---------- Aabb ----------

#[test]
fn aabb_basics() {
    let pts = [vector![1.0, -2.0, 0.5], vector![-1.0, 3.0, 0.0], vector![0.0, 0.0, 2.0]];
    let b = Aabb::from_points(pts.iter());
    assert_eq!(b.min, vector![-1.0, -2.0, 0.0]);
    assert_eq!(b.max, vector![1.0, 3.0, 2.0]);
    assert_eq!(b.longest_axis(), 1);
    assert!(b.contains_point(&vector![0.0, 0.0, 1.0]));
    assert!(!b.contains_point(&vector![0.0, 4.0, 1.0]));
    assert!((b.surface_area() - 2.0 * (2.0 * 5.0 + 5.0 * 2.0 + 2.0 * 2.0)).abs() < 1e-12);

    let empty = Aabb::from_points(std::iter::empty());
    assert_eq!(empty.min, Vector3::zeros());
    assert_eq!(empty.max, Vector3::zeros());

    // Ties resolve to the lower axis.
    let cube = Aabb::new(Vector3::zeros(), vector![1.0, 1.0, 1.0]);
    assert_eq!(cube.longest_axis(), 0);
}

#[test]
fn aabb_intersects_respects_tolerance() {
    let a = Aabb::new(Vector3::zeros(), vector![1.0, 1.0, 1.0]);
    let touching = Aabb::new(vector![1.0, 0.0, 0.0], vector![2.0, 1.0, 1.0]);
    let gap = Aabb::new(vector![1.001, 0.0, 0.0], vector![2.0, 1.0, 1.0]);
    assert!(a.intersects(&touching, 0.0));
    assert!(!a.intersects(&gap, 1e-6));
    assert!(a.intersects(&gap, 0.01));
    assert!(gap.intersects(&a, 0.01));
    assert_eq!(a.union(&gap).max, vector![2.0, 1.0, 1.0]);
    assert_eq!(a.padded(0.5).min, vector![-0.5, -0.5, -0.5]);
}

// ---------- BVH ----------

fn check_node_bounds(node: &BvhNode, mesh: &MeshData) -> Aabb {
    match node {
        BvhNode::Leaf { aabb, triangles } => {
            let union = triangles
                .iter()
                .map(|&t| Aabb::from_triangle(&mesh.triangle(t)))
                .reduce(|a, b| a.union(&b))
                .unwrap();
            assert_eq!(*aabb, union);
            *aabb
        }
        BvhNode::Internal { aabb, left, right } => {
            let l = check_node_bounds(left, mesh);
            let r = check_node_bounds(right, mesh);
            assert_eq!(*aabb, l.union(&r));
            *aabb
        }
    }
}

#[test]
fn bvh_boxes_are_unions_of_children() {
    let mesh = soup(7, 0, Vector3::zeros());
    let all: Vec<usize> = (0..mesh.faces.len()).collect();
    let bvh = BvhNode::build(&mesh, all, &BvhCfg::default()).unwrap();
    let root = check_node_bounds(&bvh, &mesh);
    let expected = Aabb::from_points(mesh.vertices.iter());
    assert!((root.min - expected.min).norm() < 1e-12);
    assert!((root.max - expected.max).norm() < 1e-12);
    assert_eq!(bvh.triangle_count(), mesh.faces.len());
}

#[test]
fn bvh_leaf_bound_holds() {
    let mesh = soup(11, 3, Vector3::zeros());
    let all: Vec<usize> = (0..mesh.faces.len()).collect();
    let cfg = BvhCfg::default();
    let bvh = BvhNode::build(&mesh, all, &cfg).unwrap();
    let mut seen = Vec::new();
    bvh.visit_leaves(&mut |depth, tris| {
        assert!(tris.len() <= cfg.max_triangles || depth == cfg.max_depth);
        seen.extend_from_slice(tris);
    });
    seen.sort_unstable();
    assert_eq!(seen, (0..mesh.faces.len()).collect::<Vec<_>>());
}

#[test]
fn bvh_depth_cap_forces_large_leaves() {
    let mesh = soup(5, 1, Vector3::zeros());
    let all: Vec<usize> = (0..mesh.faces.len()).collect();
    let cfg = BvhCfg {
        max_triangles: 1,
        max_depth: 2,
    };
    let bvh = BvhNode::build(&mesh, all, &cfg).unwrap();
    assert_eq!(bvh.depth(), 2);
    let mut leaves = 0;
    bvh.visit_leaves(&mut |depth, tris| {
        assert_eq!(depth, 2);
        assert!(tris.len() > 1);
        leaves += 1;
    });
    assert_eq!(leaves, 4);
}

#[test]
fn bvh_query_returns_overlapping_leaves_only() {
    let mut mesh = square_mesh(0.0);
    let far = square_mesh(50.0);
    let base = mesh.vertices.len();
    mesh.vertices.extend(far.vertices.iter().copied());
    mesh.faces.extend(
        far.faces
            .iter()
            .map(|f| [f[0] + base, f[1] + base, f[2] + base]),
    );
    let cfg = BvhCfg {
        max_triangles: 2,
        max_depth: 20,
    };
    let bvh = BvhNode::build(&mesh, (0..4).collect(), &cfg).unwrap();
    let mut out = Vec::new();
    bvh.query(&Aabb::new(vector![0.2, 0.2, -0.1], vector![0.4, 0.4, 0.1]), &mut out);
    out.sort_unstable();
    assert_eq!(out, vec![0, 1]);
}

#[test]
fn empty_mesh_has_no_bvh() {
    let mut det = TriangleCollisionDetector::new(MeshData::default());
    assert!(det.ensure_bvh().is_none());
    let mut other = TriangleCollisionDetector::new(square_mesh(0.0));
    assert!(!det.check_collision(&mut other, EPS));
    assert!(!other.check_collision(&mut det, EPS));
    assert!(det
        .raycast(vector![0.5, 0.5, 1.0], vector![0.0, 0.0, -1.0], EPS)
        .is_none());
}

#[test]
fn bvh_is_built_lazily() {
    let mut det = TriangleCollisionDetector::new(square_mesh(0.0));
    assert!(det.bvh().is_none());
    det.raycast(vector![0.5, 0.5, 1.0], vector![0.0, 0.0, -1.0], EPS);
    assert!(det.bvh().is_some());
}

// ---------- Detector ----------

#[test]
fn crossing_triangles_collide() {
    let (a, b) = crossing_pair();
    let mut da = TriangleCollisionDetector::new(a);
    let mut db = TriangleCollisionDetector::new(b);
    assert!(da.check_collision(&mut db, EPS));
    assert!(da.narrow_phase_tests() >= 1);
    da.reset_counters();
    assert_eq!(da.narrow_phase_tests(), 0);
}

#[test]
fn check_collision_is_symmetric() {
    let mut hits = 0;
    for seed in 0..16u64 {
        let mut a = TriangleCollisionDetector::new(soup(seed, 0, Vector3::zeros()));
        let mut b = TriangleCollisionDetector::new(soup(seed, 1, vector![1.5, 0.0, 0.0]));
        let ab = a.check_collision(&mut b, EPS);
        let ba = b.check_collision(&mut a, EPS);
        assert_eq!(ab, ba, "seed {seed}");
        hits += usize::from(ab);
    }
    // Heavily overlapping soups; at least some pairs must collide.
    assert!(hits > 0);
}

#[test]
fn disjoint_meshes_run_no_narrow_tests() {
    let mut a = TriangleCollisionDetector::new(soup(3, 0, Vector3::zeros()));
    let mut b = TriangleCollisionDetector::new(soup(3, 1, vector![100.0, 0.0, 0.0]));
    assert!(!a.check_collision(&mut b, EPS));
    assert_eq!(a.narrow_phase_tests(), 0);
    assert_eq!(b.narrow_phase_tests(), 0);
}

#[test]
fn separated_parallel_squares_do_not_collide() {
    let mut a = TriangleCollisionDetector::new(square_mesh(0.0));
    let mut b = TriangleCollisionDetector::new(square_mesh(0.5));
    assert!(!a.check_collision(&mut b, EPS));
}

#[test]
fn prisms_have_no_self_intersection() {
    let tri = [vector![0.0, 0.0, 0.0], vector![1.0, 0.0, 0.0], vector![0.0, 1.0, 0.0]];
    let square = [
        vector![0.0, 0.0, 0.0],
        vector![1.0, 0.0, 0.0],
        vector![1.0, 1.0, 0.0],
        vector![0.0, 1.0, 0.0],
    ];
    for poly in [&tri[..], &square[..]] {
        let mesh = extrude_polygon(poly, 0.1);
        assert!(!mesh.is_empty());
        let mut det = TriangleCollisionDetector::new(mesh);
        assert!(!det.check_self_intersection(EPS));
    }
}

#[test]
fn crossing_faces_self_intersect() {
    let (a, b) = crossing_pair();
    let mut mesh = a;
    let base = mesh.vertices.len();
    mesh.vertices.extend(b.vertices);
    mesh.faces.push([base, base + 1, base + 2]);
    let mut det = TriangleCollisionDetector::new(mesh);
    assert!(det.check_self_intersection(EPS));
    assert_eq!(det.narrow_phase_tests(), 1);
}

#[test]
fn raycast_hits_at_analytic_distance() {
    let mut det = TriangleCollisionDetector::new(square_mesh(0.0));
    let hit = det
        .raycast(vector![0.75, 0.25, 5.0], vector![0.0, 0.0, -1.0], EPS)
        .unwrap();
    assert!((hit.distance - 5.0).abs() < 1e-12);
    assert!((hit.point - vector![0.75, 0.25, 0.0]).norm() < 1e-12);
    assert_eq!(hit.face_id, 0);
}

#[test]
fn raycast_misses_return_none() {
    let mut det = TriangleCollisionDetector::new(square_mesh(0.0));
    // Outside the square.
    assert!(det
        .raycast(vector![5.0, 5.0, 5.0], vector![0.0, 0.0, -1.0], EPS)
        .is_none());
    // Pointing away.
    assert!(det
        .raycast(vector![0.75, 0.25, 5.0], vector![0.0, 0.0, 1.0], EPS)
        .is_none());
    // Parallel to the plane.
    assert!(det
        .raycast(vector![-1.0, 0.5, 0.0], vector![1.0, 0.0, 0.0], EPS)
        .is_none());
}

#[test]
fn raycast_returns_nearest_hit() {
    let mut mesh = square_mesh(0.0);
    let upper = square_mesh(2.0);
    mesh.vertices.extend(upper.vertices.iter().copied());
    mesh.faces.extend(upper.faces.iter().map(|f| [f[0] + 4, f[1] + 4, f[2] + 4]));
    let mut det = TriangleCollisionDetector::new(mesh);
    let hit = det
        .raycast(vector![0.75, 0.25, 5.0], vector![0.0, 0.0, -1.0], EPS)
        .unwrap();
    assert!((hit.distance - 3.0).abs() < 1e-12);
    assert_eq!(hit.face_id, 2);
}

// ---------- Validator ----------

fn unbonded(squares: &[(&str, f64, f64)]) -> MemoryAssembly {
    let mut asm = MemoryAssembly::new();
    for &(id, x, y) in squares {
        asm.add_polyform(unit_square(id, x, y));
    }
    asm
}

#[test]
fn validator_defaults() {
    let cfg = ValidatorCfg::default();
    assert_eq!(cfg.epsilon, 1e-6);
    assert_eq!(cfg.max_cache_size, 50);
    assert_eq!(cfg.thickness, 0.1);
    assert!(cfg.skip_bonded);
}

#[test]
fn separated_panels_are_collision_free() {
    let asm = unbonded(&[("A", 0.0, 0.0), ("B", 3.0, 0.0), ("C", 0.0, 3.0)]);
    let mut v = CollisionValidator::default();
    assert!(v.check_assembly_collisions(&asm).is_empty());
    assert_eq!(v.collision_report(&asm), "Assembly is collision-free");
    assert!(v.validate_fold_operation(&asm, &PolyformId::from("A")).is_ok());
}

#[test]
fn overlapping_panels_are_reported() {
    let asm = unbonded(&[("A", 0.0, 0.0), ("B", 0.5, 0.0)]);
    let mut v = CollisionValidator::default();
    let reports = v.check_assembly_collisions(&asm);
    assert_eq!(reports.len(), 1);
    let r = &reports[0];
    assert_eq!(r.kind, CollisionKind::PairCollision);
    assert_eq!(r.severity, Severity::Warning);
    assert_eq!(r.poly1_id, PolyformId::from("A"));
    assert_eq!(r.poly2_id, Some(PolyformId::from("B")));

    let text = v.collision_report(&asm);
    assert!(text.starts_with("Collision report:"));
    assert!(text.contains("Collisions (1):"));
    assert!(text.contains("Collision between A and B"));

    assert_eq!(
        v.validate_fold_operation(&asm, &PolyformId::from("B")),
        Err(FoldRejection::Collision {
            poly: "B".into(),
            other: "A".into(),
        })
    );
}

#[test]
fn bonded_neighbours_are_skipped_by_default() {
    let asm = strip(3);
    let mut v = CollisionValidator::default();
    assert!(v.check_assembly_collisions(&asm).is_empty());

    // Without the skip, the shared side faces touch.
    let mut strict = CollisionValidator::new(ValidatorCfg {
        skip_bonded: false,
        ..ValidatorCfg::default()
    });
    let reports = strict.check_assembly_collisions(&asm);
    assert!(reports
        .iter()
        .any(|r| r.poly1_id.as_str() == "P0" && r.poly2_id.as_ref().map(|p| p.as_str()) == Some("P1")));
}

#[test]
fn self_intersecting_mesh_is_an_error() {
    let (a, b) = crossing_pair();
    let mut mesh = a;
    mesh.vertices.extend(b.vertices);
    mesh.faces.push([3, 4, 5]);
    let mut poly = Polyform::new("X", mesh.vertices[..3].to_vec());
    poly.mesh = Some(mesh);
    let mut asm = MemoryAssembly::new();
    asm.add_polyform(poly);

    let mut v = CollisionValidator::default();
    let reports = v.check_assembly_collisions(&asm);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, CollisionKind::SelfIntersection);
    assert_eq!(reports[0].severity, Severity::Error);
    assert!(reports[0].poly2_id.is_none());
    assert!(v.collision_report(&asm).contains("Self-intersections (1):"));
    assert_eq!(
        v.validate_fold_operation(&asm, &PolyformId::from("X")),
        Err(FoldRejection::SelfIntersection("X".into()))
    );
}

#[test]
fn missing_polyform_is_rejected() {
    let asm = unbonded(&[("A", 0.0, 0.0)]);
    let mut v = CollisionValidator::default();
    let err = v
        .validate_fold_operation(&asm, &PolyformId::from("nope"))
        .unwrap_err();
    assert_eq!(err, FoldRejection::MissingPolyform("nope".into()));
    assert_eq!(err.to_string(), "polyform nope not found");
}

#[test]
fn degenerate_panels_have_no_detector() {
    let segment = Polyform::new("S", vec![Vector3::zeros(), vector![1.0, 0.0, 0.0]]);
    let mut v = CollisionValidator::default();
    assert!(v.get_detector(&segment).is_none());
    assert!(!v.check_self_intersection(&segment));
    assert!(!v.check_pair_collision(&segment, &unit_square("A", 0.0, 0.0)));
    assert_eq!(v.cached_len(), 0);
}

#[test]
fn detector_cache_is_bounded_and_invalidatable() {
    let asm = unbonded(&[("A", 0.0, 0.0), ("B", 3.0, 0.0), ("C", 6.0, 0.0)]);
    let mut v = CollisionValidator::new(ValidatorCfg {
        max_cache_size: 2,
        ..ValidatorCfg::default()
    });
    v.check_assembly_collisions(&asm);
    assert_eq!(v.cached_len(), 2);
    v.invalidate(&PolyformId::from("C"));
    assert!(v.cached_len() <= 2);
    v.clear_cache();
    assert_eq!(v.cached_len(), 0);
}

#[test]
fn moved_panels_get_fresh_detectors() {
    let mut asm = unbonded(&[("A", 0.0, 0.0), ("B", 0.5, 0.0)]);
    let mut v = CollisionValidator::default();
    assert_eq!(v.check_assembly_collisions(&asm).len(), 1);

    let b = asm.polyforms.iter_mut().find(|p| p.id.as_str() == "B").unwrap();
    for p in &mut b.vertices {
        p.x += 10.0;
    }
    assert!(v.check_assembly_collisions(&asm).is_empty());
}

#[test]
fn out_of_range_faces_are_treated_as_no_mesh() {
    let json = r#"{
        "polyforms": [
            { "id": "bad", "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
              "mesh": { "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "faces": [[0, 1, 7]] } },
            { "id": "A", "vertices": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]] }
        ]
    }"#;
    let asm: MemoryAssembly = serde_json::from_str(json).unwrap();
    let mut v = CollisionValidator::default();
    assert_eq!(v.collision_report(&asm), "Assembly is collision-free");
    assert!(v.get_detector(&asm.polyforms[0]).is_none());

    let bad = asm.polyforms[0].mesh.clone().unwrap();
    assert!(!bad.faces_in_range());
    let mut d = TriangleCollisionDetector::new(bad);
    assert!(d.ensure_bvh().is_none());
    assert!(!d.check_self_intersection(EPS));
    assert!(d
        .raycast(vector![0.2, 0.2, 1.0], vector![0.0, 0.0, -1.0], 1e-9)
        .is_none());
    let mut good = TriangleCollisionDetector::new(square_mesh(0.0));
    assert!(!d.check_collision(&mut good, EPS));
    assert!(!good.check_collision(&mut d, EPS));
}

#[test]
fn self_intersection_builds_bvh_lazily() {
    let mut d = TriangleCollisionDetector::new(extrude_polygon(
        &unit_square("A", 0.0, 0.0).vertices,
        0.1,
    ));
    assert!(d.bvh().is_none());
    assert!(!d.check_self_intersection(EPS));
    assert!(d.bvh().is_some());
}

#[test]
fn retriangulated_meshes_get_fresh_detectors() {
    let mut square = unit_square("Q", 0.0, 0.0);
    square.mesh = Some(square_mesh(0.0));
    let mut v = CollisionValidator::default();
    let before = v.get_detector(&square).unwrap().mesh().faces.clone();
    assert_eq!(before, vec![[0, 1, 2], [0, 2, 3]]);

    // Same vertices and face count, other diagonal.
    if let Some(mesh) = square.mesh.as_mut() {
        mesh.faces = vec![[0, 1, 3], [1, 2, 3]];
    }
    let after = v.get_detector(&square).unwrap().mesh().faces.clone();
    assert_eq!(after, vec![[0, 1, 3], [1, 2, 3]]);
    assert_eq!(v.cached_len(), 1);
}
