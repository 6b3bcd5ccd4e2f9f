//! Per-contingency fact records.
//!
//! One [`ContingencyRecord`] exists per simulated contingency, keyed by the
//! simulator-native id. Records are created empty when a contingency
//! definition is discovered in the static document, populated by merging in
//! the corresponding results, scored exactly once, and never mutated after
//! ranking.

use crate::error::{ScreenError, ScreenResult};
use crate::outcome::{FinalScore, SolverOutcome};
use serde::{Deserialize, Serialize};

/// N-1 element-outage class of a contingency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContingencyKind {
    Branch,
    Generator,
    Load,
    Shunt,
}

impl ContingencyKind {
    /// Decode the wire kind code. An unknown code is a structural error in
    /// the case document, never a recoverable condition.
    pub fn from_code(code: i64) -> ScreenResult<Self> {
        match code {
            1 => Ok(ContingencyKind::Branch),
            2 => Ok(ContingencyKind::Generator),
            3 => Ok(ContingencyKind::Load),
            4 => Ok(ContingencyKind::Shunt),
            other => Err(ScreenError::Structural(format!(
                "invalid contingency kind code {other}; expected 1..=4"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContingencyKind::Branch => "branch",
            ContingencyKind::Generator => "generator",
            ContingencyKind::Load => "load",
            ContingencyKind::Shunt => "shunt",
        }
    }
}

/// A voltage or flow constraint violation. `tempo` is the temporization in
/// seconds before the protection acts; the permanent sentinels are resolved
/// against [`crate::config::ScreeningConfig::permanent_tempo_sentinels`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitConstraint {
    pub element: i64,
    pub before: f64,
    pub after: f64,
    pub limit: f64,
    pub tempo: f64,
}

/// A generator constraint violation. The wire limit-type code has already
/// been resolved into the reactive/voltage partition by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConstraint {
    pub element: i64,
    pub before: f64,
    pub after: f64,
    pub limit: f64,
}

/// Generator constraint sub-category, split from the wire limit-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorConstraintKind {
    /// Reactive power limit reached (codes 1 and 2).
    Reactive,
    /// Voltage setpoint limit reached (codes 3 and 4).
    Voltage,
}

impl GeneratorConstraintKind {
    pub fn from_limit_type(code: i64) -> ScreenResult<Self> {
        match code {
            1 | 2 => Ok(GeneratorConstraintKind::Reactive),
            3 | 4 => Ok(GeneratorConstraintKind::Voltage),
            other => Err(ScreenError::Structural(format!(
                "invalid generator limit-type code {other}; expected 1..=4"
            ))),
        }
    }
}

/// A min or max voltage excursion attributed to this contingency, with the
/// substation the surveillance point belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageExcursion {
    pub substation: i64,
    pub observed_kv: f64,
}

/// A line-loading (max-flow) excursion, loading in percent of the limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingExcursion {
    pub branch: i64,
    pub loading: f64,
}

/// One coefficient-report row: loading ratio of a surveyed element relative
/// to its thermal limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefReportEntry {
    pub element: i64,
    pub coefficient: f64,
}

/// One node-result row. Disconnected nodes arrive on the wire with sentinel
/// values; the extractor converts them to `None` before a record is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub num: i64,
    pub voltage_kv: Option<f64>,
    pub angle_deg: Option<f64>,
    pub bus: Option<i64>,
}

/// One tap-changer movement reported by the cheap simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapMovement {
    pub transformer: String,
    pub previous: i64,
    pub after: i64,
    /// Non-zero when the tap hit its mechanical stop limiter instead of its
    /// target position.
    pub stopper: u8,
}

impl TapMovement {
    pub fn delta(&self) -> i64 {
        self.after - self.previous
    }
}

/// Tap families tracked separately in the expensive simulator's final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapKind {
    Phase,
    Ratio,
}

/// Signed difference between a contingency-case tap position and the
/// no-contingency baseline. Zero deltas are omitted at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapChangerDelta {
    pub transformer: String,
    pub kind: TapKind,
    pub delta: i64,
}

/// The fact record for one contingency.
///
/// `taps` is populated only when tap-changer modeling is enabled for the
/// run; the mode flag travels in the screening config, not in key presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContingencyRecord {
    pub id: String,
    pub name: String,
    pub kind: ContingencyKind,
    pub affected_elements: Vec<i64>,
    pub outcome: SolverOutcome,
    pub iterations: u32,
    pub duration_s: f64,
    pub flow_constraints: Vec<LimitConstraint>,
    pub voltage_constraints: Vec<LimitConstraint>,
    pub gen_reactive_constraints: Vec<GeneratorConstraint>,
    pub gen_voltage_constraints: Vec<GeneratorConstraint>,
    pub min_voltages: Vec<VoltageExcursion>,
    pub max_voltages: Vec<VoltageExcursion>,
    pub loadings: Vec<LoadingExcursion>,
    pub coef_report: Vec<CoefReportEntry>,
    pub node_results: Vec<NodeResult>,
    pub taps: Option<Vec<TapMovement>>,
    pub final_score: Option<FinalScore>,
}

impl ContingencyRecord {
    /// Create the empty record for a freshly discovered definition.
    ///
    /// Until a results entry is merged in, the outcome is `NoOutput`: a
    /// contingency that was defined but never produced output ranks with
    /// that label rather than disappearing from the output.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ContingencyKind,
        affected_elements: Vec<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            affected_elements,
            outcome: SolverOutcome::NoOutput,
            iterations: 0,
            duration_s: 0.0,
            flow_constraints: Vec::new(),
            voltage_constraints: Vec::new(),
            gen_reactive_constraints: Vec::new(),
            gen_voltage_constraints: Vec::new(),
            min_voltages: Vec::new(),
            max_voltages: Vec::new(),
            loadings: Vec::new(),
            coef_report: Vec::new(),
            node_results: Vec::new(),
            taps: None,
            final_score: None,
        }
    }

    /// Tap movement count for reporting; zero when tap mode is off.
    pub fn tap_count(&self) -> usize {
        self.taps.as_ref().map_or(0, Vec::len)
    }

    /// The status label for this record, when it is not converged.
    pub fn status_label(&self) -> Option<&'static str> {
        self.outcome.label()
    }

    /// Assign the final score. Scoring happens exactly once per record.
    pub fn set_final_score(&mut self, score: FinalScore) {
        debug_assert!(self.final_score.is_none(), "record scored twice");
        self.final_score = Some(score);
    }
}
