//! Scoring engine.
//!
//! Two interchangeable strategies assign `final_score` to every converged
//! record; non-converged records bypass both and carry their status label.
//!
//! - [`WeightTable`] - human-authored weighted linear formula, auditable
//!   coefficient by coefficient. Computes the continuous-mode features
//!   directly per record and rounds to 4 decimal places.
//! - [`RegressionModel`] - a pre-trained regression artifact evaluated on
//!   the full feature table. Four published variants exist, the cross
//!   product of {discrete, continuous} × {taps on, off}; the artifact must
//!   match the table it is evaluated on, and any schema mismatch fails
//!   fast instead of producing silent garbage.

use crate::features::{build_feature_table, ContinuousFeatures, FeatureTable};
use anyhow::{Context, Result};
use gcs_core::{
    ContingencyRecord, ElementsCatalog, FeatureMode, FinalScore, ScreenError, ScreenResult,
    ScreeningConfig,
};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Wire selector for the scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStrategy {
    /// Selector 1: hand-built weighted formula.
    WeightedFormula,
    /// Selector 2: learned regression model.
    LearnedModel,
}

impl ScoreStrategy {
    pub fn from_selector(selector: i64) -> ScreenResult<Self> {
        match selector {
            1 => Ok(ScoreStrategy::WeightedFormula),
            2 => Ok(ScoreStrategy::LearnedModel),
            other => Err(ScreenError::Config(format!(
                "invalid score type {other}; expected 1 (weighted formula) or 2 (learned model)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStrategy::WeightedFormula => "weighted",
            ScoreStrategy::LearnedModel => "learned",
        }
    }
}

/// Round to the 4 decimal places the weighted formula publishes.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

const BASE_WEIGHT_KEYS: [&str; 12] = [
    "MIN_VOLT",
    "MAX_VOLT",
    "N_ITER",
    "AFFECTED_ELEM",
    "CONSTR_GEN_Q",
    "CONSTR_GEN_U",
    "CONSTR_VOLT",
    "CONSTR_FLOW",
    "RES_NODE",
    "MAX_FLOW",
    "COEF_REPORT",
    "INTERCEPTION",
];

const TAP_WEIGHT_KEY: &str = "TAP_CHANGERS";

/// Weights of the hand-built formula, one per continuous feature plus an
/// intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    pub min_volt: f64,
    pub max_volt: f64,
    pub max_flow: f64,
    pub constr_gen_q: f64,
    pub constr_gen_u: f64,
    pub constr_volt: f64,
    pub constr_flow: f64,
    pub n_iter: f64,
    pub affected_elem: f64,
    pub res_node: f64,
    pub coef_report: f64,
    pub tap_changers: Option<f64>,
    pub intercept: f64,
}

impl WeightTable {
    /// Parse the key/value weight artifact. The key set is exact: every
    /// published key must be present, `TAP_CHANGERS` exactly when tap mode
    /// is enabled, and nothing else: a weights file disagreeing with the
    /// run about tap mode is a configuration error, not a zero weight.
    pub fn from_json(text: &str, tap_changers: bool) -> Result<Self> {
        let raw: HashMap<String, f64> =
            serde_json::from_str(text).context("parsing weight artifact")?;

        let mut expected: Vec<&str> = BASE_WEIGHT_KEYS.to_vec();
        if tap_changers {
            expected.push(TAP_WEIGHT_KEY);
        }
        for key in &expected {
            if !raw.contains_key(*key) {
                return Err(
                    ScreenError::Config(format!("weight artifact is missing key '{key}'")).into(),
                );
            }
        }
        for key in raw.keys() {
            if !expected.contains(&key.as_str()) {
                return Err(ScreenError::Config(format!(
                    "weight artifact has unexpected key '{key}'"
                ))
                .into());
            }
        }

        Ok(Self {
            min_volt: raw["MIN_VOLT"],
            max_volt: raw["MAX_VOLT"],
            max_flow: raw["MAX_FLOW"],
            constr_gen_q: raw["CONSTR_GEN_Q"],
            constr_gen_u: raw["CONSTR_GEN_U"],
            constr_volt: raw["CONSTR_VOLT"],
            constr_flow: raw["CONSTR_FLOW"],
            n_iter: raw["N_ITER"],
            affected_elem: raw["AFFECTED_ELEM"],
            res_node: raw["RES_NODE"],
            coef_report: raw["COEF_REPORT"],
            tap_changers: tap_changers.then(|| raw[TAP_WEIGHT_KEY]),
            intercept: raw["INTERCEPTION"],
        })
    }

    pub fn load(path: &Path, tap_changers: bool) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading weight artifact '{}'", path.display()))?;
        Self::from_json(&text, tap_changers)
            .with_context(|| format!("loading weight artifact '{}'", path.display()))
    }

    /// Score one converged record from its continuous features.
    pub fn score(
        &self,
        record: &ContingencyRecord,
        catalog: &ElementsCatalog,
        config: &ScreeningConfig,
    ) -> f64 {
        let f = ContinuousFeatures::compute(record, catalog, config);
        let mut score = f.min_volt * self.min_volt
            + f.max_volt * self.max_volt
            + f.max_flow * self.max_flow
            + f.constr_gen_q * self.constr_gen_q
            + f.constr_gen_u * self.constr_gen_u
            + f.constr_volt * self.constr_volt
            + f.constr_flow * self.constr_flow
            + f.n_iter * self.n_iter
            + f.affected_elem * self.affected_elem
            + f.res_node * self.res_node
            + f.coef_report * self.coef_report
            + self.intercept;
        if let (Some(taps), Some(weight)) = (f.tap_changers, self.tap_changers) {
            score += taps * weight;
        }
        round4(score)
    }
}

/// A pre-trained linear regression artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionModel {
    pub feature_mode: FeatureMode,
    pub tap_changers: bool,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RegressionModel {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading model artifact '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing model artifact '{}'", path.display()))
    }

    /// Fail fast unless the artifact matches the table it will score:
    /// same feature mode, same tap flag, identical column names and order,
    /// one coefficient per column.
    pub fn validate_against(&self, table: &FeatureTable) -> Result<()> {
        if self.feature_mode != table.mode {
            return Err(ScreenError::Config(format!(
                "model was trained on {} features but the table is {}",
                self.feature_mode.as_str(),
                table.mode.as_str()
            ))
            .into());
        }
        if self.tap_changers != table.tap_changers {
            return Err(ScreenError::Config(format!(
                "model tap-changer flag ({}) does not match the run ({})",
                self.tap_changers, table.tap_changers
            ))
            .into());
        }
        if self.feature_names != table.columns {
            return Err(ScreenError::Config(format!(
                "model feature names {:?} do not match table columns {:?}",
                self.feature_names, table.columns
            ))
            .into());
        }
        if self.coefficients.len() != self.feature_names.len() {
            return Err(ScreenError::Config(format!(
                "model has {} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            ))
            .into());
        }
        Ok(())
    }

    pub fn predict_row(&self, values: &[f64]) -> f64 {
        self.intercept
            + values
                .iter()
                .zip(&self.coefficients)
                .map(|(v, c)| v * c)
                .sum::<f64>()
    }
}

/// The scoring engine: one of the two strategies, ready to run.
pub enum Scorer {
    Weighted(WeightTable),
    Learned(RegressionModel),
}

impl Scorer {
    pub fn strategy(&self) -> ScoreStrategy {
        match self {
            Scorer::Weighted(_) => ScoreStrategy::WeightedFormula,
            Scorer::Learned(_) => ScoreStrategy::LearnedModel,
        }
    }
}

/// Assign `final_score` to every record of the case.
///
/// Converged records get a numeric score from the strategy; every other
/// record gets its status label. No record leaves unscored.
pub fn score_records(
    records: &mut [ContingencyRecord],
    catalog: &ElementsCatalog,
    config: &ScreeningConfig,
    scorer: &Scorer,
) -> Result<()> {
    match scorer {
        Scorer::Weighted(weights) => {
            let threads = if config.threads == 0 {
                num_cpus::get()
            } else {
                config.threads
            };
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("building scoring thread pool")?;
            // Per-contingency scoring is independent; the pool is a pure
            // optimization with no observable ordering effect.
            let scores: Vec<FinalScore> = pool.install(|| {
                records
                    .par_iter()
                    .map(|record| {
                        if record.outcome.is_converged() {
                            FinalScore::Value(weights.score(record, catalog, config))
                        } else {
                            FinalScore::Status(record.outcome)
                        }
                    })
                    .collect()
            });
            for (record, score) in records.iter_mut().zip(scores) {
                record.set_final_score(score);
            }
        }
        Scorer::Learned(model) => {
            let table = build_feature_table(records, catalog, model.feature_mode, config);
            model.validate_against(&table)?;
            let predictions: HashMap<String, f64> = table
                .rows
                .iter()
                .map(|row| (row.id.clone(), model.predict_row(&row.values)))
                .collect();
            for record in records.iter_mut() {
                let score = if record.outcome.is_converged() {
                    let predicted = predictions.get(&record.id).copied().ok_or_else(|| {
                        anyhow::anyhow!(
                            "no prediction for converged contingency '{}'",
                            record.id
                        )
                    })?;
                    FinalScore::Value(predicted)
                } else {
                    FinalScore::Status(record.outcome)
                };
                record.set_final_score(score);
            }
        }
    }
    Ok(())
}
