//! Small hand-built assemblies shared by unit tests across modules.

use nalgebra::{vector, Vector3};

use super::{Bond, MemoryAssembly, Polyform};

/// Axis-aligned unit square in the z=0 plane with lower-left corner `(x, y)`,
/// vertices CCW starting at the corner.
pub(crate) fn unit_square(id: &str, x: f64, y: f64) -> Polyform {
    Polyform::new(
        id,
        vec![
            vector![x, y, 0.0],
            vector![x + 1.0, y, 0.0],
            vector![x + 1.0, y + 1.0, 0.0],
            vector![x, y + 1.0, 0.0],
        ],
    )
}

/// Three squares in an L: `A` on top, `B` below it, `C` right of `B`.
///
/// Bonds: `A.0 ↔ B.2` (shared segment y=0, x∈[0,1]) and `B.1 ↔ C.3`
/// (shared segment x=1, y∈[-1,0]). There is no `A ↔ C` bond.
pub(crate) fn l_chain() -> MemoryAssembly {
    let mut asm = MemoryAssembly::new();
    asm.add_polyform(unit_square("A", 0.0, 0.0));
    asm.add_polyform(Polyform::new(
        "B",
        vec![
            vector![0.0, -1.0, 0.0],
            vector![1.0, -1.0, 0.0],
            vector![1.0, 0.0, 0.0],
            vector![0.0, 0.0, 0.0],
        ],
    ));
    asm.add_polyform(Polyform::new(
        "C",
        vec![
            vector![1.0, -1.0, 0.0],
            vector![2.0, -1.0, 0.0],
            vector![2.0, 0.0, 0.0],
            vector![1.0, 0.0, 0.0],
        ],
    ));
    asm.add_bond(Bond::new("A", 0, "B", 2));
    asm.add_bond(Bond::new("B", 1, "C", 3));
    asm
}

/// Row of `n` unit squares `P0..P{n-1}` along +x, each bonded right edge (1) to
/// the next one's left edge (3).
pub(crate) fn strip(n: usize) -> MemoryAssembly {
    let mut asm = MemoryAssembly::new();
    for i in 0..n {
        asm.add_polyform(unit_square(&format!("P{i}"), i as f64, 0.0));
    }
    for i in 1..n {
        asm.add_bond(Bond::new(format!("P{}", i - 1), 1, format!("P{i}"), 3));
    }
    asm
}

pub(crate) fn max_dist(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q).norm())
        .fold(0.0, f64::max)
}
