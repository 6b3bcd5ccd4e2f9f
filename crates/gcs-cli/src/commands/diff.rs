//! `gcs diff`: compare replay results against the screening run.

use anyhow::{anyhow, Context, Result};
use gcs_core::ScreeningConfig;
use gcs_io::{
    load_results_document, load_run_manifest, load_static_document, merge_results,
    read_replay_results,
};
use gcs_rank::{diff_all, read_feature_csv, rmse_against_predictions, write_diff_csv};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct DiffParams {
    pub manifest: PathBuf,
    pub replay_dir: PathBuf,
    pub out: PathBuf,
}

pub fn run(params: DiffParams) -> Result<()> {
    let manifest = load_run_manifest(&params.manifest)?;
    let config = ScreeningConfig {
        tap_changers: manifest.tap_changers,
        n_replay: manifest.n_replay,
        ..ScreeningConfig::default()
    };

    // Rebuild the fact records the screening run was ranked from.
    let case = load_static_document(Path::new(&manifest.static_file))?;
    let mut records = case.empty_records();
    let results = load_results_document(Path::new(&manifest.results_file))?;
    merge_results(&mut records, results, config.tap_changers)?;

    let replays = read_replay_results(&params.replay_dir, &manifest.replayed)?;
    let diffs = diff_all(&records, &replays, &case.catalog, &config);

    if let Some(parent) = params.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    write_diff_csv(&diffs, &params.out)?;
    info!(
        compared = diffs.len(),
        "diff table written to '{}'",
        params.out.display()
    );

    // RMSE against the predicted scores from the screening run's feature
    // CSV, merged by contingency name.
    let features_path = manifest
        .outputs
        .iter()
        .find(|path| path.ends_with("features.csv"))
        .ok_or_else(|| anyhow!("run manifest lists no feature CSV output"))?;
    let features = read_feature_csv(Path::new(features_path))?;
    match features
        .scores
        .as_ref()
        .and_then(|scores| rmse_against_predictions(&diffs, scores))
    {
        Some(rmse) => info!("prediction RMSE over {} contingencies: {rmse:.4}", diffs.len()),
        None => warn!("no scored contingencies merged; RMSE unavailable"),
    }

    Ok(())
}
