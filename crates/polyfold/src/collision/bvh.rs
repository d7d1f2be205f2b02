//! Median-split bounding volume hierarchy over a mesh's triangles.
//!
//! Build rule
//! - Leaf when the triangle count is `<= max_triangles` or `depth >= max_depth`.
//! - Otherwise split on the longest axis of the node box: sort by triangle
//!   centroid along that axis and cut at the median. An empty half (only
//!   possible for degenerate configs) forces a leaf.
//!
//! The tree stores no version or dirty flag. It describes the vertex positions
//! it was built from, and the owner rebuilds it after moving vertices.

use std::cmp::Ordering;

use nalgebra::Vector3;

use super::aabb::Aabb;
use super::types::{BvhCfg, AABB_EPS};
use crate::geom3::MeshData;

#[derive(Clone, Debug)]
pub enum BvhNode {
    Leaf {
        aabb: Aabb,
        triangles: Vec<usize>,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

/// Per-build scratch: triangle boxes and centroids indexed by face id.
struct BuildCtx<'a> {
    boxes: Vec<Aabb>,
    centroids: Vec<Vector3<f64>>,
    cfg: &'a BvhCfg,
}

impl BvhNode {
    /// Build over the given face indices of `mesh`. `None` if `triangles` is empty.
    pub fn build(mesh: &MeshData, triangles: Vec<usize>, cfg: &BvhCfg) -> Option<BvhNode> {
        if triangles.is_empty() {
            return None;
        }
        let (boxes, centroids): (Vec<Aabb>, Vec<Vector3<f64>>) = (0..mesh.faces.len())
            .map(|f| {
                let tri = mesh.triangle(f);
                (Aabb::from_triangle(&tri), (tri[0] + tri[1] + tri[2]) / 3.0)
            })
            .unzip();
        let ctx = BuildCtx {
            boxes,
            centroids,
            cfg,
        };
        Some(Self::build_recursive(&ctx, triangles, 0))
    }

    fn build_recursive(ctx: &BuildCtx<'_>, mut triangles: Vec<usize>, depth: usize) -> BvhNode {
        let aabb = triangles
            .iter()
            .map(|&t| ctx.boxes[t])
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Aabb::new(Vector3::zeros(), Vector3::zeros()));

        if triangles.len() <= ctx.cfg.max_triangles || depth >= ctx.cfg.max_depth {
            return BvhNode::Leaf { aabb, triangles };
        }

        let axis = aabb.longest_axis();
        triangles.sort_by(|&a, &b| {
            ctx.centroids[a][axis]
                .partial_cmp(&ctx.centroids[b][axis])
                .unwrap_or(Ordering::Equal)
        });
        let mid = triangles.len() / 2;
        if mid == 0 || mid == triangles.len() {
            return BvhNode::Leaf { aabb, triangles };
        }
        let right_tris = triangles.split_off(mid);
        let left = Self::build_recursive(ctx, triangles, depth + 1);
        let right = Self::build_recursive(ctx, right_tris, depth + 1);
        BvhNode::Internal {
            aabb,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[inline]
    pub fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    /// Append every triangle stored in a leaf whose box overlaps `aabb`
    /// (broad phase only; candidates may not actually touch the query box).
    pub fn query(&self, aabb: &Aabb, results: &mut Vec<usize>) {
        if !self.aabb().intersects(aabb, AABB_EPS) {
            return;
        }
        match self {
            BvhNode::Leaf { triangles, .. } => results.extend_from_slice(triangles),
            BvhNode::Internal { left, right, .. } => {
                left.query(aabb, results);
                right.query(aabb, results);
            }
        }
    }

    /// Visit leaves depth-first as `(depth, triangles)`.
    pub fn visit_leaves<F: FnMut(usize, &[usize])>(&self, f: &mut F) {
        self.visit_leaves_at(0, f);
    }

    fn visit_leaves_at<F: FnMut(usize, &[usize])>(&self, depth: usize, f: &mut F) {
        match self {
            BvhNode::Leaf { triangles, .. } => f(depth, triangles),
            BvhNode::Internal { left, right, .. } => {
                left.visit_leaves_at(depth + 1, f);
                right.visit_leaves_at(depth + 1, f);
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        let mut n = 0;
        self.visit_leaves(&mut |_, tris| n += tris.len());
        n
    }

    /// Height of the tree (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 0,
            BvhNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}
