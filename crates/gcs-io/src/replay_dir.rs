//! Expensive-simulator replay results reader.
//!
//! After the top-K contingencies have been re-simulated, the expensive
//! simulator leaves one directory per contingency name under the replay
//! root:
//!
//! ```text
//! replay/
//!   DEF_BRANCH_12/
//!     status.json       {"status": "CONVERGENCE"}
//!     constraints.xml   <constraints><constraint model="LINE_12" kind="flow"
//!                        value="110.3" limit="100.0"/></constraints>
//!     timeline.xml      <timeline><event time="1.5" model="GEN_7"
//!                        message="reactive power limit reached"/></timeline>
//!     final_state.xml   <final_state><phase_tap transformer="T1" position="8"/>
//!                        <ratio_tap transformer="T2" position="11"/></final_state>
//! ```
//!
//! The three auxiliary documents are read only for contingencies whose
//! status is convergent. Timeline events are filtered to
//! reactive-power-limit-reached and deduplicated to the last chronological
//! occurrence per originating model (forward scan, later events overwrite
//! earlier ones). A contingency that was replayed but has no directory is
//! reported as a warning and skipped; the rest of the batch continues.

use anyhow::{bail, Context, Result};
use quick_xml::{events::Event, Reader};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::xml::{local_name_as_str, optional_f64, required_attribute, required_i64};

/// Timeline message marking a generator's reactive power limit.
const REACTIVE_LIMIT_EVENT: &str = "reactive power limit reached";

/// Expensive-simulator status strings.
pub const STATUS_CONVERGENCE: &str = "CONVERGENCE";
pub const STATUS_DIVERGENCE: &str = "DIVERGENCE";

/// Constraint category as tagged by the expensive simulator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayConstraintKind {
    Flow,
    Voltage,
    Generator,
}

impl ReplayConstraintKind {
    fn from_wire(kind: &str) -> Result<Self> {
        match kind {
            "flow" => Ok(ReplayConstraintKind::Flow),
            "voltage" => Ok(ReplayConstraintKind::Voltage),
            "generator" => Ok(ReplayConstraintKind::Generator),
            other => bail!("unknown replay constraint kind '{other}'"),
        }
    }
}

/// One constraint entry from the expensive simulator, identified by the
/// model (element) name the simulator uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConstraint {
    pub model: String,
    pub kind: ReplayConstraintKind,
    pub value: Option<f64>,
    pub limit: Option<f64>,
}

/// Replay results for one contingency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    pub name: String,
    pub status: String,
    pub constraints: Vec<ReplayConstraint>,
    /// Phase-shifting tap positions by transformer.
    pub phase_taps: HashMap<String, i64>,
    /// Ratio-changing tap positions by transformer.
    pub ratio_taps: HashMap<String, i64>,
}

impl ReplayResult {
    pub fn is_convergent(&self) -> bool {
        self.status == STATUS_CONVERGENCE
    }
}

#[derive(Debug, Deserialize)]
struct StatusFile {
    status: String,
}

/// Read replay results for the given contingency names.
///
/// Missing directories produce a warning per contingency and are skipped;
/// the returned list covers only the contingencies that had results.
pub fn read_replay_results(root: &Path, names: &[String]) -> Result<Vec<ReplayResult>> {
    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let dir = root.join(name);
        if !dir.is_dir() {
            eprintln!("⚠ Warning: contingency '{name}' was replayed but has no results directory");
            continue;
        }
        results.push(read_one_replay(&dir, name)?);
    }
    Ok(results)
}

fn read_one_replay(dir: &Path, name: &str) -> Result<ReplayResult> {
    let status_path = dir.join("status.json");
    let status_text = fs::read_to_string(&status_path)
        .with_context(|| format!("reading replay status '{}'", status_path.display()))?;
    let status: StatusFile = serde_json::from_str(&status_text)
        .with_context(|| format!("parsing replay status '{}'", status_path.display()))?;

    let mut result = ReplayResult {
        name: name.to_string(),
        status: status.status,
        constraints: Vec::new(),
        phase_taps: HashMap::new(),
        ratio_taps: HashMap::new(),
    };

    // Auxiliary documents exist only for convergent runs.
    if !result.is_convergent() {
        return Ok(result);
    }

    let constraints_path = dir.join("constraints.xml");
    let constraints_text = fs::read_to_string(&constraints_path)
        .with_context(|| format!("reading replay constraints '{}'", constraints_path.display()))?;
    result.constraints = parse_constraints(&constraints_text)
        .with_context(|| format!("parsing replay constraints '{}'", constraints_path.display()))?;

    let timeline_path = dir.join("timeline.xml");
    let timeline_text = fs::read_to_string(&timeline_path)
        .with_context(|| format!("reading replay timeline '{}'", timeline_path.display()))?;
    result.constraints.extend(
        parse_timeline_constraints(&timeline_text)
            .with_context(|| format!("parsing replay timeline '{}'", timeline_path.display()))?,
    );

    let state_path = dir.join("final_state.xml");
    let state_text = fs::read_to_string(&state_path)
        .with_context(|| format!("reading replay final state '{}'", state_path.display()))?;
    let (phase_taps, ratio_taps) = parse_final_state(&state_text)
        .with_context(|| format!("parsing replay final state '{}'", state_path.display()))?;
    result.phase_taps = phase_taps;
    result.ratio_taps = ratio_taps;

    Ok(result)
}

fn parse_constraints(text: &str) -> Result<Vec<ReplayConstraint>> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut constraints = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                if local_name_as_str(&name) == "constraint" {
                    constraints.push(ReplayConstraint {
                        model: required_attribute(e, "model", "constraint")?,
                        kind: ReplayConstraintKind::from_wire(&required_attribute(
                            e,
                            "kind",
                            "constraint",
                        )?)?,
                        value: optional_f64(e, "value", "constraint")?,
                        limit: optional_f64(e, "limit", "constraint")?,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed constraints document: {e}"),
            _ => {}
        }
    }

    Ok(constraints)
}

/// Extract generator constraints from the event timeline.
///
/// Only reactive-power-limit events count. The timeline is scanned forward
/// in chronological order and later events overwrite earlier ones per
/// model, so exactly the last occurrence of each model survives.
fn parse_timeline_constraints(text: &str) -> Result<Vec<ReplayConstraint>> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut last_per_model: HashMap<String, f64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                if local_name_as_str(&name) == "event" {
                    let message = required_attribute(e, "message", "event")?;
                    if message != REACTIVE_LIMIT_EVENT {
                        continue;
                    }
                    let model = required_attribute(e, "model", "event")?;
                    let time = optional_f64(e, "time", "event")?.unwrap_or(0.0);
                    if last_per_model.insert(model.clone(), time).is_none() {
                        order.push(model);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed timeline document: {e}"),
            _ => {}
        }
    }

    Ok(order
        .into_iter()
        .map(|model| {
            let time = last_per_model[&model];
            ReplayConstraint {
                model,
                kind: ReplayConstraintKind::Generator,
                value: Some(time),
                limit: None,
            }
        })
        .collect())
}

fn parse_final_state(text: &str) -> Result<(HashMap<String, i64>, HashMap<String, i64>)> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut phase_taps = HashMap::new();
    let mut ratio_taps = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                let tag = local_name_as_str(&name);
                match tag {
                    "phase_tap" => {
                        phase_taps.insert(
                            required_attribute(e, "transformer", tag)?,
                            required_i64(e, "position", tag)?,
                        );
                    }
                    "ratio_tap" => {
                        ratio_taps.insert(
                            required_attribute(e, "transformer", tag)?,
                            required_i64(e, "position", tag)?,
                        );
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed final state document: {e}"),
            _ => {}
        }
    }

    Ok((phase_taps, ratio_taps))
}
