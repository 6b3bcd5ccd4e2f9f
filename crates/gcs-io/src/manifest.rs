//! Run manifest.
//!
//! Written next to the screening outputs so the diff step (and the external
//! replay orchestrator) can locate the ranking, the feature CSV and the
//! run parameters without re-deriving them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct RunManifest {
    pub created_at: DateTime<Utc>,
    pub static_file: String,
    pub results_file: String,
    pub strategy: String,
    pub feature_mode: String,
    pub tap_changers: bool,
    pub n_replay: i64,
    /// Dynamic database path handed through to the replay orchestrator.
    pub dynamic_db: Option<String>,
    /// Input directories were already contingency-expanded by the caller.
    pub pre_generated: bool,
    pub replayed: Vec<String>,
    pub outputs: Vec<String>,
}

pub fn write_run_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(manifest).context("serializing run manifest to JSON")?;
    fs::write(path, json).with_context(|| format!("writing run manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_run_manifest(path: &Path) -> Result<RunManifest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading run manifest '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing run manifest '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn manifest_writes_and_reads_back() {
        let manifest = RunManifest {
            created_at: Utc::now(),
            static_file: "case/network.xml".into(),
            results_file: "case/results.xml".into(),
            strategy: "weighted".into(),
            feature_mode: "continuous".into(),
            tap_changers: true,
            n_replay: 25,
            dynamic_db: Some("db/dynamic".into()),
            pre_generated: false,
            replayed: vec!["DEF_BRANCH_12".into()],
            outputs: vec!["out/ranking.txt".into(), "out/features.csv".into()],
        };
        let tmp = NamedTempFile::new().unwrap();
        write_run_manifest(tmp.path(), &manifest).unwrap();
        let parsed = load_run_manifest(tmp.path()).unwrap();
        assert_eq!(parsed.strategy, "weighted");
        assert_eq!(parsed.n_replay, 25);
        assert_eq!(parsed.replayed, manifest.replayed);
    }
}
