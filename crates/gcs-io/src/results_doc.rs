//! Cheap-simulator results document parser and record merge.
//!
//! Expected shape:
//!
//! ```xml
//! <results>
//!   <contingency id="12" status="0" iterations="12" duration="0.85">
//!     <constraints>
//!       <flow element="12" before="95.0" after="112.0" limit="100.0" tempo="300"/>
//!       <voltage element="3" before="242.0" after="249.5" limit="245.0" tempo="9999"/>
//!       <generator element="7" before="40.0" after="85.0" limit="80.0" limit_type="2"/>
//!     </constraints>
//!     <loadings> <loading branch="12" value="112.5"/> </loadings>
//!     <coef_report> <coef element="12" value="0.95"/> </coef_report>
//!     <node_results>
//!       <node num="4" voltage="238.1" angle="12.3" bus="4"/>
//!       <node num="5" voltage="999999" angle="999999" bus="-1"/>
//!     </node_results>
//!     <taps> <tap transformer="T1" previous="8" after="11" stopper="0"/> </taps>
//!   </contingency>
//!   <surveillance>
//!     <voltage_range substation="3" vmin="198.5" vmax="241.0"
//!                    min_owner="12" max_owner="7"/>
//!   </surveillance>
//! </results>
//! ```
//!
//! The `<surveillance>` section is global: each surveyed point records which
//! contingency variant produced its min and its max, so two contingencies
//! can share credit for the two endpoints of one voltage range. Owner
//! attributes equal to -1 mean "no excursion recorded for this endpoint".
//!
//! Disconnected-node sentinels (999999 voltage/angle, -1 bus) are converted
//! to `None` here; nothing downstream sees them.

use anyhow::{anyhow, bail, Context, Result};
use gcs_core::{
    CoefReportEntry, ContingencyRecord, GeneratorConstraint, GeneratorConstraintKind,
    LimitConstraint, LoadingExcursion, NodeResult, SolverOutcome, TapMovement, VoltageExcursion,
};
use quick_xml::{events::BytesStart, events::Event, Reader};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::xml::{
    attribute_value, local_name_as_str, optional_f64, optional_i64, required_f64, required_i64,
};

/// Wire value for a disconnected node's voltage or angle.
const DISCONNECTED_SENTINEL: f64 = 999_999.0;
/// Wire value for "no element referenced".
const NO_ELEMENT: i64 = -1;

/// Results of one contingency, before merging into its record.
#[derive(Debug, Default)]
pub struct ContingencyResults {
    pub id: String,
    pub status: i64,
    pub iterations: u32,
    pub duration_s: f64,
    pub flow_constraints: Vec<LimitConstraint>,
    pub voltage_constraints: Vec<LimitConstraint>,
    pub gen_reactive_constraints: Vec<GeneratorConstraint>,
    pub gen_voltage_constraints: Vec<GeneratorConstraint>,
    pub loadings: Vec<LoadingExcursion>,
    pub coef_report: Vec<CoefReportEntry>,
    pub node_results: Vec<NodeResult>,
    pub taps: Vec<TapMovement>,
}

/// One surveyed voltage range with per-endpoint contingency attribution.
#[derive(Debug, Clone)]
pub struct VoltageRange {
    pub substation: i64,
    pub vmin: f64,
    pub vmax: f64,
    pub min_owner: Option<String>,
    pub max_owner: Option<String>,
}

/// Parsed results document.
#[derive(Debug, Default)]
pub struct ResultsDocument {
    pub contingencies: Vec<ContingencyResults>,
    pub surveillance: Vec<VoltageRange>,
}

pub fn load_results_document(path: &Path) -> Result<ResultsDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading results document '{}'", path.display()))?;
    parse_results_document(&text)
        .with_context(|| format!("parsing results document '{}'", path.display()))
}

fn sentinel_f64(value: f64) -> Option<f64> {
    (value != DISCONNECTED_SENTINEL).then_some(value)
}

fn sentinel_element(value: i64) -> Option<i64> {
    (value != NO_ELEMENT).then_some(value)
}

fn owner_attr(e: &BytesStart, key: &str, element: &str) -> Result<Option<String>> {
    match attribute_value(e, key)? {
        Some(raw) if raw == "-1" => Ok(None),
        Some(raw) => Ok(Some(raw)),
        None => Err(anyhow!(
            "element <{element}> is missing required attribute '{key}'"
        )),
    }
}

pub fn parse_results_document(text: &str) -> Result<ResultsDocument> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut document = ResultsDocument::default();
    let mut current: Option<ContingencyResults> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                let tag = local_name_as_str(&name);
                match tag {
                    "contingency" => {
                        // A self-closing <contingency/> never sees an End
                        // event; flush it when the next one opens.
                        if let Some(results) = current.take() {
                            document.contingencies.push(results);
                        }
                        current = Some(ContingencyResults {
                            id: crate::xml::required_attribute(e, "id", tag)?,
                            status: required_i64(e, "status", tag)?,
                            iterations: optional_i64(e, "iterations", tag)?.unwrap_or(0) as u32,
                            duration_s: optional_f64(e, "duration", tag)?.unwrap_or(0.0),
                            ..ContingencyResults::default()
                        });
                    }
                    "flow" | "voltage" => {
                        let constraint = LimitConstraint {
                            element: required_i64(e, "element", tag)?,
                            before: required_f64(e, "before", tag)?,
                            after: required_f64(e, "after", tag)?,
                            limit: required_f64(e, "limit", tag)?,
                            tempo: required_f64(e, "tempo", tag)?,
                        };
                        let results = current
                            .as_mut()
                            .ok_or_else(|| anyhow!("<{tag}> outside of <contingency>"))?;
                        if tag == "flow" {
                            results.flow_constraints.push(constraint);
                        } else {
                            results.voltage_constraints.push(constraint);
                        }
                    }
                    "generator" => {
                        let kind = GeneratorConstraintKind::from_limit_type(required_i64(
                            e,
                            "limit_type",
                            tag,
                        )?)?;
                        let constraint = GeneratorConstraint {
                            element: required_i64(e, "element", tag)?,
                            before: required_f64(e, "before", tag)?,
                            after: required_f64(e, "after", tag)?,
                            limit: required_f64(e, "limit", tag)?,
                        };
                        let results = current
                            .as_mut()
                            .ok_or_else(|| anyhow!("<{tag}> outside of <contingency>"))?;
                        match kind {
                            GeneratorConstraintKind::Reactive => {
                                results.gen_reactive_constraints.push(constraint)
                            }
                            GeneratorConstraintKind::Voltage => {
                                results.gen_voltage_constraints.push(constraint)
                            }
                        }
                    }
                    "loading" => {
                        let loading = LoadingExcursion {
                            branch: required_i64(e, "branch", tag)?,
                            loading: required_f64(e, "value", tag)?,
                        };
                        current
                            .as_mut()
                            .ok_or_else(|| anyhow!("<{tag}> outside of <contingency>"))?
                            .loadings
                            .push(loading);
                    }
                    "coef" => {
                        let entry = CoefReportEntry {
                            element: required_i64(e, "element", tag)?,
                            coefficient: required_f64(e, "value", tag)?,
                        };
                        current
                            .as_mut()
                            .ok_or_else(|| anyhow!("<{tag}> outside of <contingency>"))?
                            .coef_report
                            .push(entry);
                    }
                    "node" => {
                        let node = NodeResult {
                            num: required_i64(e, "num", tag)?,
                            voltage_kv: sentinel_f64(required_f64(e, "voltage", tag)?),
                            angle_deg: sentinel_f64(required_f64(e, "angle", tag)?),
                            bus: sentinel_element(required_i64(e, "bus", tag)?),
                        };
                        current
                            .as_mut()
                            .ok_or_else(|| anyhow!("<{tag}> outside of <contingency>"))?
                            .node_results
                            .push(node);
                    }
                    "tap" => {
                        let tap = TapMovement {
                            transformer: crate::xml::required_attribute(e, "transformer", tag)?,
                            previous: required_i64(e, "previous", tag)?,
                            after: required_i64(e, "after", tag)?,
                            stopper: required_i64(e, "stopper", tag)? as u8,
                        };
                        current
                            .as_mut()
                            .ok_or_else(|| anyhow!("<{tag}> outside of <contingency>"))?
                            .taps
                            .push(tap);
                    }
                    "voltage_range" => {
                        document.surveillance.push(VoltageRange {
                            substation: required_i64(e, "substation", tag)?,
                            vmin: required_f64(e, "vmin", tag)?,
                            vmax: required_f64(e, "vmax", tag)?,
                            min_owner: owner_attr(e, "min_owner", tag)?,
                            max_owner: owner_attr(e, "max_owner", tag)?,
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name_as_str(&e.local_name()) == "contingency" {
                    if let Some(results) = current.take() {
                        document.contingencies.push(results);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed results document: {e}"),
            _ => {}
        }
    }

    if let Some(results) = current.take() {
        document.contingencies.push(results);
    }

    Ok(document)
}

/// Merge parsed results into the records built from the static document.
///
/// Every results entry must reference a defined contingency; an unknown id
/// is a structural error for the whole case. Records without a results
/// entry keep their initial `NoOutput` outcome. Tap movements are attached
/// only when tap-changer mode is enabled for the run.
pub fn merge_results(
    records: &mut [ContingencyRecord],
    results: ResultsDocument,
    tap_changers: bool,
) -> Result<()> {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        by_id.insert(record.id.clone(), index);
    }

    for entry in results.contingencies {
        let index = *by_id.get(&entry.id).ok_or_else(|| {
            anyhow!(
                "results reference contingency id '{}' which is not defined in the static document",
                entry.id
            )
        })?;
        let record = &mut records[index];
        record.outcome = SolverOutcome::from_code(entry.status);
        record.iterations = entry.iterations;
        record.duration_s = entry.duration_s;
        record.flow_constraints = entry.flow_constraints;
        record.voltage_constraints = entry.voltage_constraints;
        record.gen_reactive_constraints = entry.gen_reactive_constraints;
        record.gen_voltage_constraints = entry.gen_voltage_constraints;
        record.loadings = entry.loadings;
        record.coef_report = entry.coef_report;
        record.node_results = entry.node_results;
        record.taps = tap_changers.then_some(entry.taps);
    }

    for range in results.surveillance {
        if let Some(owner) = range.min_owner {
            let index = *by_id.get(&owner).ok_or_else(|| {
                anyhow!("voltage range min owner '{owner}' is not a defined contingency")
            })?;
            records[index].min_voltages.push(VoltageExcursion {
                substation: range.substation,
                observed_kv: range.vmin,
            });
        }
        if let Some(owner) = range.max_owner {
            let index = *by_id.get(&owner).ok_or_else(|| {
                anyhow!("voltage range max owner '{owner}' is not a defined contingency")
            })?;
            records[index].max_voltages.push(VoltageExcursion {
                substation: range.substation,
                observed_kv: range.vmax,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_core::ContingencyKind;

    const DOC: &str = r#"
        <results>
          <contingency id="12" status="0" iterations="12" duration="0.85">
            <constraints>
              <flow element="12" before="95.0" after="112.0" limit="100.0" tempo="300"/>
              <voltage element="3" before="242.0" after="249.5" limit="245.0" tempo="9999"/>
              <generator element="7" before="40.0" after="85.0" limit="80.0" limit_type="2"/>
              <generator element="8" before="1.0" after="1.1" limit="1.05" limit_type="3"/>
            </constraints>
            <loadings> <loading branch="12" value="112.5"/> </loadings>
            <coef_report> <coef element="12" value="0.95"/> </coef_report>
            <node_results>
              <node num="4" voltage="238.1" angle="12.3" bus="4"/>
              <node num="5" voltage="999999" angle="999999" bus="-1"/>
            </node_results>
            <taps> <tap transformer="T1" previous="8" after="11" stopper="0"/> </taps>
          </contingency>
          <contingency id="7" status="1"/>
          <surveillance>
            <voltage_range substation="3" vmin="198.5" vmax="241.0"
                           min_owner="12" max_owner="7"/>
            <voltage_range substation="4" vmin="220.0" vmax="244.0"
                           min_owner="-1" max_owner="12"/>
          </surveillance>
        </results>
    "#;

    fn base_records() -> Vec<ContingencyRecord> {
        vec![
            ContingencyRecord::new("12", "DEF_BRANCH_12", ContingencyKind::Branch, vec![12]),
            ContingencyRecord::new("7", "DEF_GEN_7", ContingencyKind::Generator, vec![7]),
        ]
    }

    #[test]
    fn parses_contingency_results() {
        let doc = parse_results_document(DOC).unwrap();
        assert_eq!(doc.contingencies.len(), 2);

        let first = &doc.contingencies[0];
        assert_eq!(first.id, "12");
        assert_eq!(first.status, 0);
        assert_eq!(first.iterations, 12);
        assert_eq!(first.flow_constraints.len(), 1);
        assert_eq!(first.voltage_constraints.len(), 1);
        assert_eq!(first.gen_reactive_constraints.len(), 1);
        assert_eq!(first.gen_voltage_constraints.len(), 1);
        assert_eq!(first.taps.len(), 1);
    }

    #[test]
    fn sentinels_become_none_at_the_boundary() {
        let doc = parse_results_document(DOC).unwrap();
        let nodes = &doc.contingencies[0].node_results;
        assert_eq!(nodes[0].voltage_kv, Some(238.1));
        assert_eq!(nodes[1].voltage_kv, None);
        assert_eq!(nodes[1].angle_deg, None);
        assert_eq!(nodes[1].bus, None);
    }

    #[test]
    fn merge_populates_records_and_splits_owner_credit() {
        let mut records = base_records();
        let doc = parse_results_document(DOC).unwrap();
        merge_results(&mut records, doc, true).unwrap();

        let branch = &records[0];
        assert_eq!(branch.outcome, SolverOutcome::Converged);
        assert_eq!(branch.flow_constraints.len(), 1);
        // Substation 3's min and substation 4's max both credit id 12.
        assert_eq!(branch.min_voltages.len(), 1);
        assert_eq!(branch.max_voltages.len(), 1);
        assert_eq!(branch.max_voltages[0].substation, 4);
        assert_eq!(branch.taps.as_ref().map(Vec::len), Some(1));

        let gen = &records[1];
        assert_eq!(gen.outcome, SolverOutcome::Divergence);
        // Substation 3's max credits id 7 even though 12 owns its min.
        assert_eq!(gen.max_voltages.len(), 1);
        assert_eq!(gen.max_voltages[0].observed_kv, 241.0);
    }

    #[test]
    fn tap_mode_disabled_leaves_taps_none() {
        let mut records = base_records();
        let doc = parse_results_document(DOC).unwrap();
        merge_results(&mut records, doc, false).unwrap();
        assert!(records[0].taps.is_none());
    }

    #[test]
    fn unknown_results_id_is_fatal() {
        let mut records = base_records();
        let doc = parse_results_document(
            r#"<results><contingency id="99" status="0"/></results>"#,
        )
        .unwrap();
        let err = merge_results(&mut records, doc, false).unwrap_err();
        assert!(err.to_string().contains("not defined"));
    }

    #[test]
    fn invalid_generator_limit_type_is_fatal() {
        let doc = r#"
            <results>
              <contingency id="1" status="0">
                <constraints>
                  <generator element="7" before="0" after="1" limit="1" limit_type="9"/>
                </constraints>
              </contingency>
            </results>
        "#;
        assert!(parse_results_document(doc).is_err());
    }
}
