//! Indexed triangle meshes for panels: normals, extrusion, rigid transforms.
//!
//! Purpose
//! - Give panels an optional thin-solid surface that the collision detector can
//!   consume, and let the hinge manager fold whole meshes.
//!
//! Conventions
//! - Faces are CCW when viewed from outside; face normals follow the right-hand rule.
//! - Vertex normals are the normalized sum of incident face normals.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::cfg::NORMAL_EPS;
use super::intersect::Triangle;

/// Triangle mesh with per-vertex normals.
///
/// Invariants:
/// - `normals.len() == vertices.len()`.
/// - Every face index is `< vertices.len()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vector3<f64>>,
    pub faces: Vec<[usize; 3]>,
    #[serde(default)]
    pub normals: Vec<Vector3<f64>>,
}

impl MeshData {
    /// Build a mesh and compute smooth vertex normals.
    pub fn new(vertices: Vec<Vector3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        let normals = compute_vertex_normals(&vertices, &faces);
        Self {
            vertices,
            faces,
            normals,
        }
    }

    /// Recompute normals if they are missing (e.g. after deserializing without them).
    pub fn ensure_normals(&mut self) {
        if self.normals.len() != self.vertices.len() {
            self.normals = compute_vertex_normals(&self.vertices, &self.faces);
        }
    }

    /// True when every face index addresses a vertex. Deserialized meshes
    /// are not checked on load; consumers call this before indexing.
    pub fn faces_in_range(&self) -> bool {
        let n = self.vertices.len();
        self.faces.iter().all(|f| f.iter().all(|&v| v < n))
    }

    /// Panics on an out-of-range face; see `faces_in_range`.
    #[inline]
    pub fn triangle(&self, face: usize) -> Triangle {
        let [a, b, c] = self.faces[face];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Unit face normals; degenerate faces keep their (short) raw cross product.
/// Faces with an out-of-range index get a zero normal.
pub fn compute_face_normals(vertices: &[Vector3<f64>], faces: &[[usize; 3]]) -> Vec<Vector3<f64>> {
    faces
        .iter()
        .map(|&[a, b, c]| match (vertices.get(a), vertices.get(b), vertices.get(c)) {
            (Some(pa), Some(pb), Some(pc)) => normalize_or_keep((pb - pa).cross(&(pc - pa))),
            _ => Vector3::zeros(),
        })
        .collect()
}

pub fn compute_vertex_normals(
    vertices: &[Vector3<f64>],
    faces: &[[usize; 3]],
) -> Vec<Vector3<f64>> {
    let mut out = vec![Vector3::zeros(); vertices.len()];
    for (face, n) in faces.iter().zip(compute_face_normals(vertices, faces)) {
        for &vid in face {
            if let Some(slot) = out.get_mut(vid) {
                *slot += n;
            }
        }
    }
    for n in out.iter_mut() {
        *n = normalize_or_keep(*n);
    }
    out
}

#[inline]
pub(crate) fn normalize_or_keep(n: Vector3<f64>) -> Vector3<f64> {
    let len = n.norm();
    if len > NORMAL_EPS {
        n / len
    } else {
        n
    }
}

/// Newell normal of a (possibly non-planar) polygon, unnormalized.
pub fn polygon_normal(points: &[Vector3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut acc = Vector3::zeros();
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        acc.x += (p.y - q.y) * (p.z + q.z);
        acc.y += (p.z - q.z) * (p.x + q.x);
        acc.z += (p.x - q.x) * (p.y + q.y);
    }
    acc
}

/// Extrude a planar polygon into a closed prism of the given thickness,
/// centered on the polygon's plane.
///
/// Layout: bottom ring `0..n`, top ring `n..2n`. Caps are fans from the first
/// ring vertex; each side quad is split into two triangles. The extrusion
/// direction is the polygon's Newell normal (so an xy-polygon in CCW order is
/// extruded along +z). Returns an empty mesh for fewer than 3 points or a
/// degenerate polygon.
pub fn extrude_polygon(points: &[Vector3<f64>], thickness: f64) -> MeshData {
    let n = points.len();
    if n < 3 {
        return MeshData::default();
    }
    let normal = polygon_normal(points);
    let len = normal.norm();
    if len <= NORMAL_EPS {
        return MeshData::default();
    }
    let offset = normal * (0.5 * thickness / len);

    let mut vertices = Vec::with_capacity(2 * n);
    vertices.extend(points.iter().map(|p| p - offset));
    vertices.extend(points.iter().map(|p| p + offset));

    let mut faces = Vec::with_capacity(2 * (n - 2) + 2 * n);
    for i in 1..n - 1 {
        faces.push([0, i + 1, i]);
    }
    for i in 1..n - 1 {
        faces.push([n, n + i, n + i + 1]);
    }
    for i in 0..n {
        let next = (i + 1) % n;
        faces.push([i, next, n + i]);
        faces.push([next, n + next, n + i]);
    }
    MeshData::new(vertices, faces)
}

/// Apply a 4×4 affine transform. Normals use the upper 3×3 block (no
/// translation) and are re-normalized.
pub fn transform_mesh(mesh: &MeshData, m: &Matrix4<f64>) -> MeshData {
    let vertices = mesh
        .vertices
        .iter()
        .map(|v| m.transform_point(&Point3::from(*v)).coords)
        .collect();
    let linear: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
    let normals = mesh
        .normals
        .iter()
        .map(|n| normalize_or_keep(linear * n))
        .collect();
    MeshData {
        vertices,
        faces: mesh.faces.clone(),
        normals,
    }
}
