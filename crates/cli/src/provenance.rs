use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What a run was asked to do; recorded next to its result file.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    /// Subcommand name, e.g. `periodic`.
    pub command: String,
    /// The map as typed on the command line.
    pub vars: Vec<String>,
    pub polys: Vec<String>,
    /// Subcommand options (primes, workers, point, ...).
    pub params: Value,
}

/// Write `FILE.provenance.json` next to `artifact` with the code revision,
/// callsite, run parameters and a short summary of the result.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, record: &RunRecord, summary: Value) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = sidecar_path(artifact);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let doc = json!({
        "tool": "projdyn",
        "version": projdyn::VERSION,
        "code_rev": current_git_rev(),
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "run": record,
        "summary": summary,
        "outputs": [artifact.to_string_lossy()]
    });
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "result".into());
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Commit hash from `GIT_COMMIT` (build time, then run time) or `git`.
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
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record() -> RunRecord {
        RunRecord {
            command: "periods".into(),
            vars: vec!["x".into(), "y".into()],
            polys: vec!["x^2 - 29/16*y^2".into(), "y^2".into()],
            params: json!({"primes": 20}),
        }
    }

    #[test]
    fn sidecar_keeps_the_full_file_name() {
        let derived = sidecar_path(Path::new("/tmp/output/periods.json"));
        assert_eq!(derived, Path::new("/tmp/output/periods.json.provenance.json"));
    }

    #[test]
    fn write_sidecar_records_run_and_outputs() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("nested").join("a.json");
        let path = write_sidecar(&artifact, &record(), json!({"count": 2})).unwrap();
        assert!(path.exists());
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["run"]["command"], "periods");
        assert_eq!(parsed["run"]["params"]["primes"], 20);
        assert_eq!(parsed["summary"]["count"], 2);
        assert_eq!(parsed["tool"], "projdyn");
    }
}
