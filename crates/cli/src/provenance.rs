//! Provenance sidecars for CLI outputs.
//!
//! `polyfold solve` writes `<stem>.provenance.json` next to the folded
//! assembly. It records how the fold was produced: code revision and library
//! version, the command and its parameters, whether the solver converged,
//! the size of the assembly and constraint set, and every file written.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Sizes of what the solver worked on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub polyforms: usize,
    pub bonds: usize,
    pub constraints: usize,
}

/// One command run, as recorded in a sidecar.
#[derive(Debug, Serialize)]
pub struct Payload {
    pub command: &'static str,
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    pub stats: RunStats,
    /// Files written besides the primary artifact (e.g. exported constraints).
    #[serde(skip)]
    pub extra_outputs: Vec<PathBuf>,
}

impl Payload {
    pub fn new(command: &'static str, params: Value) -> Self {
        Self {
            command,
            params,
            converged: None,
            stats: RunStats::default(),
            extra_outputs: Vec::new(),
        }
    }

    pub fn converged(mut self, converged: bool) -> Self {
        self.converged = Some(converged);
        self
    }

    pub fn stats(mut self, stats: RunStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_outputs.push(path.into());
        self
    }
}

#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: String,
    version: &'static str,
    #[serde(flatten)]
    run: &'a Payload,
    outputs: Vec<String>,
}

/// Write the sidecar for `artifact` and return its path.
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: &Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = sidecar_path(artifact);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }
    let outputs = std::iter::once(artifact)
        .chain(payload.extra_outputs.iter().map(PathBuf::as_path))
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let doc = Sidecar {
        code_rev: current_git_rev(),
        version: polyfold::VERSION,
        run: payload,
        outputs,
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// `folded.json` → `folded.provenance.json`.
fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Build-time `GIT_COMMIT`, then runtime `GIT_COMMIT`, then `git rev-parse HEAD`.
pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|s| !s.is_empty()) {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
