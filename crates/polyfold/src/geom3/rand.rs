//! Random triangle soups (replayable) for collision tests and benchmarks.
//!
//! Model
//! - Each triangle gets a uniform centre in the cube `[-extent, extent]³` and
//!   three corners jittered around it by at most `size` per axis.
//! - Every triangle owns its three vertices; no vertex is shared, so
//!   self-intersection checks consider every pair.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::mesh::MeshData;

#[derive(Clone, Copy, Debug)]
pub struct SoupCfg {
    pub triangles: usize,
    /// Half-width of the cube holding triangle centres.
    pub extent: f64,
    /// Max per-axis offset of a corner from its triangle centre.
    pub size: f64,
}

impl Default for SoupCfg {
    fn default() -> Self {
        Self {
            triangles: 64,
            extent: 5.0,
            size: 0.5,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    fn to_std_rng(self) -> StdRng {
        // SplitMix64 finaliser.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        StdRng::seed_from_u64(mix(
            self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)),
        ))
    }
}

/// Draw a soup of `cfg.triangles` independent triangles, translated by `offset`.
pub fn draw_triangle_soup(cfg: SoupCfg, offset: Vector3<f64>, tok: ReplayToken) -> MeshData {
    let mut rng = tok.to_std_rng();
    let extent = cfg.extent.abs();
    let size = cfg.size.abs().max(1e-9);
    let mut vertices = Vec::with_capacity(cfg.triangles * 3);
    let mut faces = Vec::with_capacity(cfg.triangles);
    for t in 0..cfg.triangles {
        let centre = offset + uniform_in_cube(&mut rng, extent);
        for _ in 0..3 {
            vertices.push(centre + uniform_in_cube(&mut rng, size));
        }
        faces.push([3 * t, 3 * t + 1, 3 * t + 2]);
    }
    MeshData::new(vertices, faces)
}

fn uniform_in_cube<R: Rng>(rng: &mut R, half: f64) -> Vector3<f64> {
    if half == 0.0 {
        return Vector3::zeros();
    }
    Vector3::new(
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
    )
}
