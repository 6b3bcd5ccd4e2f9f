//! Static network document parser.
//!
//! The cheap simulator's static document describes the base case: one
//! section per element kind plus the contingency definitions. Expected
//! shape:
//!
//! ```xml
//! <network>
//!   <substations>
//!     <substation num="1" name="ALPHA" vnom="225" vmin="200" vmax="245"/>
//!   </substations>
//!   <buses>
//!     <bus num="4" name="ALPHA.B1" substation="1" vinit="238.1"/>
//!   </buses>
//!   <generators> <generator num="7" name="GEN7" substation="1"/> </generators>
//!   <loads> <load num="3" name="LOAD3" substation="2"/> </loads>
//!   <shunts> <shunt num="9" name="SH9" substation="2"/> </shunts>
//!   <branches>
//!     <branch num="12" name="ALPHA-BETA.1" substation="1"
//!             resistance="1.2" reactance="11.5"/>
//!   </branches>
//!   <taps> <tap transformer="T1" position="8"/> </taps>
//!   <contingencies>
//!     <contingency id="12" name="DEF_BRANCH_12" kind="1">
//!       <element num="12"/>
//!     </contingency>
//!   </contingencies>
//! </network>
//! ```
//!
//! Bus `vinit` values become the no-contingency recorded voltage of the
//! bus's substation; the optional `<taps>` section is the no-contingency
//! tap baseline. A duplicate contingency id is a structural error: the
//! whole case is rejected, nothing is recovered per contingency.

use anyhow::{bail, Context, Result};
use gcs_core::{ContingencyKind, ContingencyRecord, ElementKind, ElementRecord, ElementsCatalog};
use quick_xml::{events::BytesStart, events::Event, Reader};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::xml::{
    local_name_as_str, optional_f64, optional_i64, required_attribute, required_i64,
};

/// One contingency definition from the static document.
#[derive(Debug, Clone)]
pub struct ContingencyDefinition {
    pub id: String,
    pub name: String,
    pub kind: ContingencyKind,
    pub elements: Vec<i64>,
}

/// Parsed static document: the elements catalog (voltage levels already
/// propagated) and the contingency definitions in document order.
#[derive(Debug)]
pub struct StaticDocument {
    pub catalog: ElementsCatalog,
    pub definitions: Vec<ContingencyDefinition>,
}

impl StaticDocument {
    /// Create one empty [`ContingencyRecord`] per definition, in document
    /// order. Records start with the `NoOutput` outcome until results are
    /// merged in.
    pub fn empty_records(&self) -> Vec<ContingencyRecord> {
        self.definitions
            .iter()
            .map(|def| {
                ContingencyRecord::new(&def.id, &def.name, def.kind, def.elements.clone())
            })
            .collect()
    }
}

pub fn load_static_document(path: &Path) -> Result<StaticDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading static document '{}'", path.display()))?;
    parse_static_document(&text)
        .with_context(|| format!("parsing static document '{}'", path.display()))
}

#[derive(Default)]
struct ParseState {
    catalog: ElementsCatalog,
    definitions: Vec<ContingencyDefinition>,
    seen_ids: HashSet<String>,
    current: Option<ContingencyDefinition>,
    bus_voltages: Vec<(i64, f64)>,
}

impl ParseState {
    fn open_element(&mut self, e: &BytesStart) -> Result<()> {
        let name = e.local_name();
        let tag = local_name_as_str(&name);
        match tag {
            "substation" => {
                self.catalog.insert(
                    ElementKind::Substation,
                    ElementRecord {
                        num: required_i64(e, "num", tag)?,
                        name: required_attribute(e, "name", tag)?,
                        nominal_kv: optional_f64(e, "vnom", tag)?,
                        vmin_kv: optional_f64(e, "vmin", tag)?,
                        vmax_kv: optional_f64(e, "vmax", tag)?,
                        ..ElementRecord::default()
                    },
                );
            }
            "bus" => {
                let num = required_i64(e, "num", tag)?;
                let substation = optional_i64(e, "substation", tag)?;
                if let (Some(sub), Some(vinit)) = (substation, optional_f64(e, "vinit", tag)?) {
                    self.bus_voltages.push((sub, vinit));
                }
                self.catalog.insert(
                    ElementKind::Bus,
                    ElementRecord {
                        num,
                        name: required_attribute(e, "name", tag)?,
                        substation,
                        ..ElementRecord::default()
                    },
                );
            }
            "generator" | "load" | "shunt" => {
                let kind = match tag {
                    "generator" => ElementKind::Generator,
                    "load" => ElementKind::Load,
                    _ => ElementKind::Shunt,
                };
                self.catalog.insert(
                    kind,
                    ElementRecord {
                        num: required_i64(e, "num", tag)?,
                        name: required_attribute(e, "name", tag)?,
                        substation: optional_i64(e, "substation", tag)?,
                        ..ElementRecord::default()
                    },
                );
            }
            "branch" => {
                self.catalog.insert(
                    ElementKind::Branch,
                    ElementRecord {
                        num: required_i64(e, "num", tag)?,
                        name: required_attribute(e, "name", tag)?,
                        substation: optional_i64(e, "substation", tag)?,
                        resistance: optional_f64(e, "resistance", tag)?,
                        reactance: optional_f64(e, "reactance", tag)?,
                        ..ElementRecord::default()
                    },
                );
            }
            "tap" => {
                let transformer = required_attribute(e, "transformer", tag)?;
                let position = required_i64(e, "position", tag)?;
                self.catalog.set_tap_baseline(&transformer, position);
            }
            "contingency" => {
                let id = required_attribute(e, "id", tag)?;
                if !self.seen_ids.insert(id.clone()) {
                    bail!("duplicate contingency id '{id}' in static document");
                }
                self.current = Some(ContingencyDefinition {
                    id,
                    name: required_attribute(e, "name", tag)?,
                    kind: ContingencyKind::from_code(required_i64(e, "kind", tag)?)?,
                    elements: Vec::new(),
                });
            }
            "element" => {
                if let Some(pending) = self.current.as_mut() {
                    pending.elements.push(required_i64(e, "num", tag)?);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close_contingency(&mut self) {
        if let Some(definition) = self.current.take() {
            self.definitions.push(definition);
        }
    }
}

pub fn parse_static_document(text: &str) -> Result<StaticDocument> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut state = ParseState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => state.open_element(e)?,
            Ok(Event::Empty(ref e)) => {
                let is_contingency = local_name_as_str(&e.local_name()) == "contingency";
                state.open_element(e)?;
                // A self-closing <contingency/> never sees an End event.
                if is_contingency {
                    state.close_contingency();
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name_as_str(&e.local_name()) == "contingency" {
                    state.close_contingency();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed static document: {e}"),
            _ => {}
        }
    }

    if state.definitions.is_empty() {
        bail!("static document defines no contingencies");
    }

    state.catalog.propagate_voltage_levels();
    for (substation, kv) in state.bus_voltages {
        state.catalog.set_recorded_voltage(substation, kv);
    }

    Ok(StaticDocument {
        catalog: state.catalog,
        definitions: state.definitions,
    })
}
