//! Fold a plus-shaped net (base plus four flaps) into an open box and print
//! the flap corners and the collision report.
//!
//! Usage:
//!   cargo run -p polyfold --example fold_open_box -- [angle_degrees]

use nalgebra::vector;
use polyfold::api::{
    Assembly, Bond, CollisionValidator, ConstraintMode, ForwardKinematics, MemoryAssembly,
    Polyform, ValidatorCfg,
};

fn square(id: &str, x: f64, y: f64) -> Polyform {
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

fn main() {
    let degrees: f64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(90.0);

    let mut asm = MemoryAssembly::new();
    asm.add_polyform(square("base", 0.0, 0.0));
    asm.add_polyform(square("south", 0.0, -1.0));
    asm.add_polyform(square("east", 1.0, 0.0));
    asm.add_polyform(square("north", 0.0, 1.0));
    asm.add_polyform(square("west", -1.0, 0.0));
    asm.add_bond(Bond::new("base", 0, "south", 2));
    asm.add_bond(Bond::new("base", 1, "east", 3));
    asm.add_bond(Bond::new("base", 2, "north", 0));
    asm.add_bond(Bond::new("base", 3, "west", 1));

    let mut fk = ForwardKinematics::default();
    fk.set_angle("base", 0, degrees.to_radians());
    fk.set_mode("base", 0, ConstraintMode::Chain);
    let converged = fk.solve(&mut asm, 10);
    println!("converged: {converged}");

    for poly in asm.get_all_polyforms() {
        let zs: Vec<String> = poly.vertices.iter().map(|v| format!("{:+.3}", v.z)).collect();
        println!("{:>6}: z = [{}]", poly.id, zs.join(", "));
    }

    let mut validator = CollisionValidator::new(ValidatorCfg::default());
    println!("{}", validator.collision_report(&asm));
}
