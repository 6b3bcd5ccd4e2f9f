//! `gcs features`: export the feature table without ranking.

use anyhow::{Context, Result};
use gcs_core::{FeatureMode, ScreeningConfig};
use gcs_io::{load_results_document, load_static_document, merge_results};
use gcs_rank::{build_feature_table, write_excluded_report, write_feature_csv};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub struct FeatureParams {
    pub static_file: PathBuf,
    pub results: PathBuf,
    pub tap_changers: bool,
    pub mode: FeatureMode,
    pub out: PathBuf,
}

pub fn run(params: FeatureParams) -> Result<()> {
    let config = ScreeningConfig {
        tap_changers: params.tap_changers,
        ..ScreeningConfig::default()
    };

    let case = load_static_document(&params.static_file)?;
    let mut records = case.empty_records();
    let results = load_results_document(&params.results)?;
    merge_results(&mut records, results, config.tap_changers)?;

    let table = build_feature_table(&records, &case.catalog, params.mode, &config);
    if let Some(parent) = params.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    write_feature_csv(&table, &params.out, None)?;
    let excluded_path = params.out.with_extension("excluded.csv");
    write_excluded_report(&table.excluded, &excluded_path)?;

    info!(
        rows = table.rows.len(),
        excluded = table.excluded.len(),
        "feature table written to '{}'",
        params.out.display()
    );
    Ok(())
}
