use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use polyfold::api::{
    CollisionValidator, ConstraintMode, ConstraintRecord, ForwardKinematics, Hinge, HingeCfg,
    HingeManager, MemoryAssembly, PolyformId, ValidatorCfg, DEFAULT_MAX_ITERATIONS,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

#[derive(Parser)]
#[command(name = "polyfold")]
#[command(about = "Fold, validate and inspect polyform nets")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Apply hinge-angle constraints and write the folded assembly
    Solve(SolveArgs),
    /// Print the collision report of an assembly
    Check(CheckArgs),
    /// List hinges derived from bonds, or the hinge path between two panels
    Hinges(HingesArgs),
    /// Print a small provenance JSON block
    Report,
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Assembly JSON: `{ "polyforms": [...], "bonds": [...] }`
    #[arg(long)]
    assembly: PathBuf,
    /// Constraint records to import before `--set` is applied
    #[arg(long)]
    constraints: Option<PathBuf>,
    /// Edge angle as POLY:EDGE:ANGLE (repeatable)
    #[arg(long = "set", value_name = "POLY:EDGE:ANGLE")]
    set: Vec<SetAngle>,
    /// Mode given to every `--set` constraint
    #[arg(long, default_value = "CHAIN")]
    mode: ConstraintMode,
    /// Read `--set` angles as degrees
    #[arg(long)]
    degrees: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Folded assembly output path
    #[arg(long)]
    out: PathBuf,
    /// Optional export of the final constraint records
    #[arg(long)]
    constraints_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long)]
    assembly: PathBuf,
    /// Prism thickness for panels without a mesh
    #[arg(long, default_value_t = 0.1)]
    thickness: f64,
    /// Also test bonded neighbours against each other
    #[arg(long)]
    include_bonded: bool,
    /// Exit with an error when any collision is found
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct HingesArgs {
    #[arg(long)]
    assembly: PathBuf,
    #[arg(long, requires = "to")]
    from: Option<String>,
    #[arg(long, requires = "from")]
    to: Option<String>,
}

/// One `--set` argument.
#[derive(Clone, Debug, PartialEq)]
struct SetAngle {
    poly: String,
    edge: usize,
    angle: f64,
}

impl FromStr for SetAngle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Ids may contain ':'; edge and angle are the last two fields.
        let mut parts = s.rsplitn(3, ':');
        let (Some(angle), Some(edge), Some(poly)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected POLY:EDGE:ANGLE, got {s:?}"));
        };
        if poly.is_empty() {
            return Err(format!("empty polyform id in {s:?}"));
        }
        let edge = edge
            .parse::<usize>()
            .map_err(|e| format!("bad edge index {edge:?}: {e}"))?;
        let angle = angle
            .parse::<f64>()
            .map_err(|e| format!("bad angle {angle:?}: {e}"))?;
        if !angle.is_finite() {
            return Err(format!("angle must be finite, got {angle}"));
        }
        Ok(Self {
            poly: poly.to_owned(),
            edge,
            angle,
        })
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Solve(args) => solve(&args).map(|_| ()),
        Action::Check(args) => {
            println!("{}", check(&args)?);
            Ok(())
        }
        Action::Hinges(args) => {
            println!("{}", hinges(&args)?);
            Ok(())
        }
        Action::Report => report(),
    }
}

fn load_assembly(path: &Path) -> Result<MemoryAssembly> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing assembly {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}

/// Returns whether the solver converged. Non-convergence is logged, not an error.
fn solve(args: &SolveArgs) -> Result<bool> {
    tracing::info!(assembly = %args.assembly.display(), out = %args.out.display(), "solve");
    let mut asm = load_assembly(&args.assembly)?;
    let mut fk = ForwardKinematics::default();

    if let Some(path) = &args.constraints {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let records: BTreeMap<String, ConstraintRecord> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing constraints {}", path.display()))?;
        let n = fk
            .import_constraints(&records)
            .with_context(|| format!("importing constraints {}", path.display()))?;
        tracing::info!(n, "imported constraints");
    }
    for s in &args.set {
        let angle = if args.degrees {
            s.angle.to_radians()
        } else {
            s.angle
        };
        fk.set_angle(s.poly.as_str(), s.edge, angle);
        fk.set_mode(s.poly.as_str(), s.edge, args.mode);
    }

    let converged = fk.solve(&mut asm, args.max_iterations);
    if converged {
        tracing::info!("solver converged");
    } else {
        tracing::warn!(max_iterations = args.max_iterations, "solver did not converge");
    }

    write_json(&args.out, &asm)?;
    let mut payload = provenance::Payload::new(
        "solve",
        serde_json::json!({
            "assembly": args.assembly.to_string_lossy(),
            "constraints": args.constraints.as_ref().map(|p| p.to_string_lossy().into_owned()),
            "set": args.set.iter().map(|s| format!("{}:{}:{}", s.poly, s.edge, s.angle)).collect::<Vec<_>>(),
            "mode": args.mode.name(),
            "degrees": args.degrees,
            "max_iterations": args.max_iterations,
        }),
    )
    .converged(converged)
    .stats(provenance::RunStats {
        polyforms: asm.polyforms.len(),
        bonds: asm.bonds.len(),
        constraints: fk.constraints().count(),
    });
    if let Some(path) = &args.constraints_out {
        write_json(path, &fk.export_constraints())?;
        payload = payload.with_output(path);
    }
    provenance::write_sidecar(&args.out, &payload)?;
    Ok(converged)
}

fn check(args: &CheckArgs) -> Result<String> {
    let asm = load_assembly(&args.assembly)?;
    let mut validator = CollisionValidator::new(ValidatorCfg {
        thickness: args.thickness,
        skip_bonded: !args.include_bonded,
        ..ValidatorCfg::default()
    });
    let report = validator.collision_report(&asm);
    if args.strict && !validator.check_assembly_collisions(&asm).is_empty() {
        bail!("{report}");
    }
    Ok(report)
}

fn hinges(args: &HingesArgs) -> Result<String> {
    let asm = load_assembly(&args.assembly)?;
    let mut manager = HingeManager::new(HingeCfg::default());
    manager.rebuild_from_assembly(&asm);
    let list: Vec<&Hinge> = match (&args.from, &args.to) {
        (Some(from), Some(to)) => {
            let (from, to) = (PolyformId::from(from.as_str()), PolyformId::from(to.as_str()));
            let path = manager.fold_chain_hinges(&from, &to);
            if path.is_empty() && from != to {
                tracing::warn!(%from, %to, "no hinge path");
            }
            path
        }
        _ => manager.graph.iter_active().map(|(_, h)| h).collect(),
    };
    Ok(serde_json::to_string_pretty(&list)?)
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "version": polyfold::VERSION,
        "modes": ConstraintMode::ALL.iter().map(|m| m.name()).collect::<Vec<_>>(),
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
