//! `gcs screen`: the full screening pipeline for one case.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use gcs_core::{FeatureMode, FinalScore, ScreeningConfig};
use gcs_io::{load_results_document, load_static_document, merge_results, RunManifest};
use gcs_rank::{
    build_feature_table, rank_records, render_ranking_report, score_records, select_top,
    write_excluded_report, write_feature_csv, RegressionModel, ScoreStrategy, Scorer, WeightTable,
};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub struct ScreenParams {
    pub static_file: PathBuf,
    pub results: PathBuf,
    pub tap_changers: bool,
    pub score_type: i64,
    pub weights: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub replay: i64,
    pub threads: usize,
    pub dynamic_db: Option<PathBuf>,
    pub pre_generated: bool,
    pub out_dir: PathBuf,
}

pub fn run(params: ScreenParams) -> Result<()> {
    let config = ScreeningConfig {
        tap_changers: params.tap_changers,
        n_replay: params.replay,
        threads: params.threads,
        ..ScreeningConfig::default()
    };

    // Extraction: catalog + definitions, then the results merge.
    let case = load_static_document(&params.static_file)?;
    let mut records = case.empty_records();
    let results = load_results_document(&params.results)?;
    merge_results(&mut records, results, config.tap_changers)?;
    info!(
        contingencies = records.len(),
        "extracted case '{}'",
        params.static_file.display()
    );

    // Scoring strategy selection is strict: an invalid selector or a
    // missing artifact terminates the run.
    let strategy = ScoreStrategy::from_selector(params.score_type)?;
    let scorer = match strategy {
        ScoreStrategy::WeightedFormula => {
            let path = params
                .weights
                .as_ref()
                .ok_or_else(|| anyhow!("--weights is required for score type 1"))?;
            Scorer::Weighted(WeightTable::load(path, config.tap_changers)?)
        }
        ScoreStrategy::LearnedModel => {
            let path = params
                .model
                .as_ref()
                .ok_or_else(|| anyhow!("--model is required for score type 2"))?;
            Scorer::Learned(RegressionModel::load(path)?)
        }
    };
    let feature_mode = match &scorer {
        Scorer::Weighted(_) => FeatureMode::Continuous,
        Scorer::Learned(model) => model.feature_mode,
    };
    score_records(&mut records, &case.catalog, &config, &scorer)?;

    // Feature CSV with the assigned scores, for reporting and retraining.
    let table = build_feature_table(&records, &case.catalog, feature_mode, &config);
    let scores: HashMap<String, f64> = records
        .iter()
        .filter_map(|record| match &record.final_score {
            Some(FinalScore::Value(v)) => Some((record.id.clone(), *v)),
            _ => None,
        })
        .collect();

    fs::create_dir_all(&params.out_dir).with_context(|| {
        format!("creating output directory '{}'", params.out_dir.display())
    })?;
    let features_path = params.out_dir.join("features.csv");
    write_feature_csv(&table, &features_path, Some(&scores))?;
    let excluded_path = params.out_dir.join("excluded.csv");
    write_excluded_report(&table.excluded, &excluded_path)?;

    // Ranking, selection, report.
    let ranked = rank_records(records, &config)?;
    let top = select_top(&ranked, config.n_replay);
    let replayed: Vec<String> = top.iter().map(|r| r.name.clone()).collect();

    let report = render_ranking_report(&ranked, config.tap_changers)?;
    let report_path = params.out_dir.join("ranking.txt");
    fs::write(&report_path, &report)
        .with_context(|| format!("writing ranking report '{}'", report_path.display()))?;
    print!("{report}");
    info!(
        ranked = ranked.len(),
        selected = replayed.len(),
        "ranking written to '{}'",
        report_path.display()
    );

    let manifest = RunManifest {
        created_at: Utc::now(),
        static_file: params.static_file.display().to_string(),
        results_file: params.results.display().to_string(),
        strategy: strategy.as_str().to_string(),
        feature_mode: feature_mode.as_str().to_string(),
        tap_changers: config.tap_changers,
        n_replay: config.n_replay,
        dynamic_db: params.dynamic_db.map(|p| p.display().to_string()),
        pre_generated: params.pre_generated,
        replayed,
        outputs: vec![
            report_path.display().to_string(),
            features_path.display().to_string(),
            excluded_path.display().to_string(),
        ],
    };
    let manifest_path = params.out_dir.join("run_manifest.json");
    gcs_io::write_run_manifest(&manifest_path, &manifest)?;
    info!("run manifest written to '{}'", manifest_path.display());

    Ok(())
}
