//! Cross-simulator diff.
//!
//! After the top-K contingencies have been re-simulated by the expensive
//! simulator, each one gets an observed discrepancy score used to validate
//! and recalibrate the screening model.
//!
//! The convergence comparison is asymmetric on purpose: exactly one
//! simulator converging is a worse prediction failure than both diverging,
//! where the prediction was at least directionally right.

use gcs_core::{
    ContingencyRecord, ElementKind, ElementsCatalog, ScreeningConfig, TapChangerDelta, TapKind,
};
use gcs_io::{ReplayConstraint, ReplayConstraintKind, ReplayResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Convergence comparison between the two simulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceCategory {
    /// Both converged; a detailed constraint comparison follows.
    Both,
    /// Only the expensive simulator converged.
    Dwo,
    /// Only the cheap simulator converged.
    Hds,
    /// Neither converged.
    None,
}

impl ConvergenceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvergenceCategory::Both => "BOTH",
            ConvergenceCategory::Dwo => "DWO",
            ConvergenceCategory::Hds => "HDS",
            ConvergenceCategory::None => "NONE",
        }
    }
}

/// Combine the cheap simulator's outcome with the expensive simulator's
/// status string.
pub fn categorize(cheap_converged: bool, expensive_convergent: bool) -> ConvergenceCategory {
    match (cheap_converged, expensive_convergent) {
        (true, true) => ConvergenceCategory::Both,
        (false, true) => ConvergenceCategory::Dwo,
        (true, false) => ConvergenceCategory::Hds,
        (false, false) => ConvergenceCategory::None,
    }
}

/// Observed discrepancy for one re-simulated contingency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffRecord {
    pub name: String,
    pub category: ConvergenceCategory,
    pub diff_value: f64,
    /// Constraint entries preserved but not scored: unmatched names, and
    /// every generator entry until their comparison is specified.
    pub unscored: Vec<String>,
    /// Final-state tap deltas against the no-contingency baseline,
    /// preserved for reporting; their scoring is the [`compare_taps`] gap.
    pub tap_deltas: Vec<TapChangerDelta>,
}

/// Signed tap deltas of the replay's final state against the baseline,
/// phase and ratio taps separately, zero deltas omitted. Transformers
/// without a recorded baseline are skipped.
pub fn tap_deltas(replay: &ReplayResult, catalog: &ElementsCatalog) -> Vec<TapChangerDelta> {
    let mut deltas = Vec::new();
    for (kind, taps) in [
        (TapKind::Phase, &replay.phase_taps),
        (TapKind::Ratio, &replay.ratio_taps),
    ] {
        let mut positions: Vec<(&String, &i64)> = taps.iter().collect();
        positions.sort();
        for (transformer, position) in positions {
            if let Some(baseline) = catalog.tap_baseline(transformer) {
                let delta = position - baseline;
                if delta != 0 {
                    deltas.push(TapChangerDelta {
                        transformer: transformer.clone(),
                        kind,
                        delta,
                    });
                }
            }
        }
    }
    deltas
}

/// Tap-position comparison between the two simulators.
///
/// Not yet specified: the comparison contract for phase/ratio tap deltas
/// against the cheap simulator's movements is an open gap upstream.
/// Contributes nothing to the diff value until it is defined.
pub fn compare_taps(_record: &ContingencyRecord, _replay: &ReplayResult) -> f64 {
    0.0
}

fn cheap_constraint_names(
    record: &ContingencyRecord,
    catalog: &ElementsCatalog,
    kind: ReplayConstraintKind,
) -> Vec<(String, f64)> {
    let lookup = |element_kind: ElementKind, num: i64| {
        catalog
            .get(element_kind, num)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("{}#{num}", element_kind.as_str()))
    };
    match kind {
        ReplayConstraintKind::Flow => record
            .flow_constraints
            .iter()
            .map(|c| (lookup(ElementKind::Branch, c.element), c.after))
            .collect(),
        ReplayConstraintKind::Voltage => record
            .voltage_constraints
            .iter()
            .map(|c| (lookup(ElementKind::Bus, c.element), c.after))
            .collect(),
        ReplayConstraintKind::Generator => record
            .gen_reactive_constraints
            .iter()
            .chain(&record.gen_voltage_constraints)
            .map(|c| (lookup(ElementKind::Generator, c.element), c.after))
            .collect(),
    }
}

/// Match constraint entries between the two simulators by element name,
/// within one category.
///
/// Matched flow/voltage pairs contribute `|after_cheap − value_expensive|`.
/// Unmatched entries on either side are preserved unscored. The generator
/// matching condition is not yet specified upstream; every generator entry
/// is filed as unscored rather than guessed at.
fn compare_constraints(
    record: &ContingencyRecord,
    replay_constraints: &[ReplayConstraint],
    catalog: &ElementsCatalog,
    kind: ReplayConstraintKind,
    unscored: &mut Vec<String>,
) -> f64 {
    let cheap = cheap_constraint_names(record, catalog, kind);
    let replay: Vec<&ReplayConstraint> = replay_constraints
        .iter()
        .filter(|c| c.kind == kind)
        .collect();

    if kind == ReplayConstraintKind::Generator {
        unscored.extend(cheap.into_iter().map(|(name, _)| name));
        unscored.extend(replay.into_iter().map(|c| c.model.clone()));
        return 0.0;
    }

    let cheap_by_name: HashMap<&str, f64> =
        cheap.iter().map(|(name, after)| (name.as_str(), *after)).collect();
    let replay_names: Vec<&str> = replay.iter().map(|c| c.model.as_str()).collect();

    let mut diff = 0.0;
    for constraint in &replay {
        match (cheap_by_name.get(constraint.model.as_str()), constraint.value) {
            (Some(after), Some(value)) => diff += (after - value).abs(),
            _ => unscored.push(constraint.model.clone()),
        }
    }
    for (name, _) in &cheap {
        if !replay_names.contains(&name.as_str()) {
            unscored.push(name.clone());
        }
    }
    diff
}

/// Compute the diff record for one re-simulated contingency.
pub fn diff_contingency(
    record: &ContingencyRecord,
    replay: &ReplayResult,
    catalog: &ElementsCatalog,
    config: &ScreeningConfig,
) -> DiffRecord {
    let category = categorize(record.outcome.is_converged(), replay.is_convergent());
    let mut unscored = Vec::new();
    let deltas = tap_deltas(replay, catalog);
    let diff_value = match category {
        ConvergenceCategory::Both => {
            let mut diff = 0.0;
            for kind in [
                ReplayConstraintKind::Flow,
                ReplayConstraintKind::Voltage,
                ReplayConstraintKind::Generator,
            ] {
                diff += compare_constraints(record, &replay.constraints, catalog, kind, &mut unscored);
            }
            diff + compare_taps(record, replay)
        }
        ConvergenceCategory::Dwo | ConvergenceCategory::Hds => config.one_sided_penalty,
        ConvergenceCategory::None => config.both_diverged_penalty,
    };
    DiffRecord {
        name: record.name.clone(),
        category,
        diff_value,
        unscored,
        tap_deltas: deltas,
    }
}

/// Diff every replayed contingency against its record.
///
/// A replay result whose contingency is unknown to the case is reported as
/// a warning and skipped; the rest of the batch continues.
pub fn diff_all(
    records: &[ContingencyRecord],
    replays: &[ReplayResult],
    catalog: &ElementsCatalog,
    config: &ScreeningConfig,
) -> Vec<DiffRecord> {
    let by_name: HashMap<&str, &ContingencyRecord> =
        records.iter().map(|r| (r.name.as_str(), r)).collect();
    let mut diffs = Vec::with_capacity(replays.len());
    for replay in replays {
        match by_name.get(replay.name.as_str()) {
            Some(record) => diffs.push(diff_contingency(record, replay, catalog, config)),
            None => {
                eprintln!(
                    "⚠ Warning: replay results for unknown contingency '{}' ignored",
                    replay.name
                );
            }
        }
    }
    diffs
}

/// Root mean square error between predicted scores and observed diff
/// values, merged by contingency name. `None` when nothing merges.
pub fn rmse_against_predictions(
    diffs: &[DiffRecord],
    predictions: &HashMap<String, f64>,
) -> Option<f64> {
    let merged: Vec<f64> = diffs
        .iter()
        .filter_map(|diff| {
            predictions
                .get(&diff.name)
                .map(|predicted| (predicted - diff.diff_value).powi(2))
        })
        .collect();
    if merged.is_empty() {
        return None;
    }
    Some((merged.iter().sum::<f64>() / merged.len() as f64).sqrt())
}
