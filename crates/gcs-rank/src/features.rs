//! Feature aggregation.
//!
//! Turns one [`ContingencyRecord`] plus the [`ElementsCatalog`] into one
//! fixed-shape feature vector, in one of two modes:
//!
//! - **Discrete:** each feature is a raw violation count.
//! - **Continuous:** each feature is a magnitude-weighted aggregate, so two
//!   contingencies with the same violation count but different violation
//!   depths score differently.
//!
//! Contingencies that did not converge are excluded from the table and
//! recorded against their status label instead; they carry no feature
//! vector at all.

use gcs_core::{
    ContingencyRecord, ElementKind, ElementsCatalog, FeatureMode, GeneratorConstraint,
    LimitConstraint, LoadingExcursion, ScreeningConfig, TapMovement, VoltageExcursion,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names of the discrete table, in output order.
pub const DISCRETE_COLUMNS: [&str; 8] = [
    "min_volt",
    "max_volt",
    "constr_gen_q",
    "constr_gen_u",
    "constr_volt",
    "constr_flow",
    "n_iter",
    "affected_elem",
];

/// Column names of the continuous table, in output order.
pub const CONTINUOUS_COLUMNS: [&str; 11] = [
    "min_volt",
    "max_volt",
    "max_flow",
    "constr_gen_q",
    "constr_gen_u",
    "constr_volt",
    "constr_flow",
    "n_iter",
    "affected_elem",
    "res_node",
    "coef_report",
];

/// Trailing column added in either mode when tap-changer modeling is on.
pub const TAP_COLUMN: &str = "tap_changers";

/// Stable column order for a mode/tap combination.
pub fn feature_columns(mode: FeatureMode, tap_changers: bool) -> Vec<String> {
    let mut columns: Vec<String> = match mode {
        FeatureMode::Discrete => DISCRETE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        FeatureMode::Continuous => CONTINUOUS_COLUMNS.iter().map(|c| c.to_string()).collect(),
    };
    if tap_changers {
        columns.push(TAP_COLUMN.to_string());
    }
    columns
}

/// Tap-magnitude sum: each movement contributes its absolute position
/// delta, or the stop-limiter penalty when the tap hit its mechanical stop.
pub fn tap_magnitude(taps: &[TapMovement], config: &ScreeningConfig) -> f64 {
    taps.iter()
        .map(|tap| {
            if tap.stopper != 0 {
                config.tap_stop_penalty
            } else {
                tap.delta().abs() as f64
            }
        })
        .sum()
}

/// Voltage-excursion diff: `count + Σ|observed − recorded|`, where the
/// recorded voltage is the no-contingency bus voltage of the excursion's
/// substation. An unrecorded substation contributes its count term only.
fn voltage_diff(excursions: &[VoltageExcursion], catalog: &ElementsCatalog) -> f64 {
    excursions.len() as f64
        + excursions
            .iter()
            .filter_map(|exc| {
                catalog
                    .recorded_voltage(exc.substation)
                    .map(|recorded| (exc.observed_kv - recorded).abs())
            })
            .sum::<f64>()
}

/// Flow diff: `count + Σ(|loading| / 10)`.
fn flow_diff(loadings: &[LoadingExcursion]) -> f64 {
    loadings.len() as f64 + loadings.iter().map(|l| l.loading.abs() / 10.0).sum::<f64>()
}

/// Generator constraint score: `count + Σ|after − before| × (1 + vl/10)`,
/// voltage level from the generator's owning substation. A missing level
/// degrades to a neutral factor of 1.
fn generator_score(constraints: &[GeneratorConstraint], catalog: &ElementsCatalog) -> f64 {
    constraints.len() as f64
        + constraints
            .iter()
            .map(|c| {
                let level = catalog
                    .voltage_level(ElementKind::Generator, c.element)
                    .unwrap_or(0.0);
                (c.after - c.before).abs() * (1.0 + level / 10.0)
            })
            .sum::<f64>()
}

/// Temporization score for voltage/flow constraints. A permanent
/// temporization contributes a flat score; a timed one contributes
/// `min(cap, 10000/tempo) × (1 + vl/10)`.
fn tempo_score(
    constraints: &[LimitConstraint],
    element_kind: ElementKind,
    catalog: &ElementsCatalog,
    config: &ScreeningConfig,
) -> f64 {
    constraints
        .iter()
        .map(|c| {
            if config.is_permanent_tempo(c.tempo) {
                config.permanent_tempo_score
            } else {
                let level = catalog
                    .voltage_level(element_kind, c.element)
                    .unwrap_or(0.0);
                (10_000.0 / c.tempo).min(config.tempo_score_cap) * (1.0 + level / 10.0)
            }
        })
        .sum()
}

/// Continuous-mode feature values for one converged contingency.
///
/// The weighted-formula strategy consumes these directly; the learned-model
/// strategy consumes them through the table form.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousFeatures {
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
}

impl ContinuousFeatures {
    pub fn compute(
        record: &ContingencyRecord,
        catalog: &ElementsCatalog,
        config: &ScreeningConfig,
    ) -> Self {
        Self {
            min_volt: voltage_diff(&record.min_voltages, catalog),
            max_volt: voltage_diff(&record.max_voltages, catalog),
            max_flow: flow_diff(&record.loadings),
            constr_gen_q: generator_score(&record.gen_reactive_constraints, catalog),
            constr_gen_u: generator_score(&record.gen_voltage_constraints, catalog),
            constr_volt: tempo_score(
                &record.voltage_constraints,
                ElementKind::Bus,
                catalog,
                config,
            ),
            constr_flow: tempo_score(
                &record.flow_constraints,
                ElementKind::Branch,
                catalog,
                config,
            ),
            n_iter: record.iterations as f64,
            affected_elem: record.affected_elements.len() as f64,
            res_node: record.node_results.len() as f64,
            coef_report: record.coef_report.len() as f64,
            tap_changers: record
                .taps
                .as_deref()
                .map(|taps| tap_magnitude(taps, config)),
        }
    }

    /// Values in [`CONTINUOUS_COLUMNS`] order, tap column last when present.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = vec![
            self.min_volt,
            self.max_volt,
            self.max_flow,
            self.constr_gen_q,
            self.constr_gen_u,
            self.constr_volt,
            self.constr_flow,
            self.n_iter,
            self.affected_elem,
            self.res_node,
            self.coef_report,
        ];
        if let Some(taps) = self.tap_changers {
            row.push(taps);
        }
        row
    }
}

/// Discrete-mode feature values for one converged contingency.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteFeatures {
    pub min_volt: f64,
    pub max_volt: f64,
    pub constr_gen_q: f64,
    pub constr_gen_u: f64,
    pub constr_volt: f64,
    pub constr_flow: f64,
    pub n_iter: f64,
    pub affected_elem: f64,
    pub tap_changers: Option<f64>,
}

impl DiscreteFeatures {
    pub fn compute(record: &ContingencyRecord, config: &ScreeningConfig) -> Self {
        Self {
            min_volt: record.min_voltages.len() as f64,
            max_volt: record.max_voltages.len() as f64,
            constr_gen_q: record.gen_reactive_constraints.len() as f64,
            constr_gen_u: record.gen_voltage_constraints.len() as f64,
            constr_volt: record.voltage_constraints.len() as f64,
            constr_flow: record.flow_constraints.len() as f64,
            n_iter: record.iterations as f64,
            affected_elem: record.affected_elements.len() as f64,
            tap_changers: record
                .taps
                .as_deref()
                .map(|taps| tap_magnitude(taps, config)),
        }
    }

    /// Values in [`DISCRETE_COLUMNS`] order, tap column last when present.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = vec![
            self.min_volt,
            self.max_volt,
            self.constr_gen_q,
            self.constr_gen_u,
            self.constr_volt,
            self.constr_flow,
            self.n_iter,
            self.affected_elem,
        ];
        if let Some(taps) = self.tap_changers {
            row.push(taps);
        }
        row
    }
}

/// One row of the feature table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: String,
    pub name: String,
    pub values: Vec<f64>,
}

/// The feature table for one case: rows for converged contingencies in
/// input order, named columns in stable order, plus the side map of
/// excluded contingency id → status label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    pub mode: FeatureMode,
    pub tap_changers: bool,
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
    pub excluded: BTreeMap<String, String>,
}

/// Build the feature table for all records of one case.
pub fn build_feature_table(
    records: &[ContingencyRecord],
    catalog: &ElementsCatalog,
    mode: FeatureMode,
    config: &ScreeningConfig,
) -> FeatureTable {
    let mut table = FeatureTable {
        mode,
        tap_changers: config.tap_changers,
        columns: feature_columns(mode, config.tap_changers),
        rows: Vec::new(),
        excluded: BTreeMap::new(),
    };

    for record in records {
        match record.status_label() {
            Some(label) => {
                table.excluded.insert(record.id.clone(), label.to_string());
            }
            None => {
                let values = match mode {
                    FeatureMode::Discrete => DiscreteFeatures::compute(record, config).to_row(),
                    FeatureMode::Continuous => {
                        ContinuousFeatures::compute(record, catalog, config).to_row()
                    }
                };
                table.rows.push(FeatureRow {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    values,
                });
            }
        }
    }

    table
}
