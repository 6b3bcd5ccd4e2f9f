//! Static elements catalog.
//!
//! The catalog is built once per base case from the static network document
//! and is read-only afterwards: every per-contingency computation shares it
//! by reference. It holds one record per element keyed by (kind, number),
//! the no-contingency recorded bus voltage per substation, and the
//! no-contingency tap baseline per transformer.
//!
//! Voltage levels are propagated from substations to the elements that
//! reference them. A reference to a substation that is not in the catalog
//! leaves the voltage level as `None`; an unknown level must never abort
//! scoring of the whole case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Element kinds present in the static document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Substation,
    Bus,
    Generator,
    Load,
    Shunt,
    Branch,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Substation => "substation",
            ElementKind::Bus => "bus",
            ElementKind::Generator => "generator",
            ElementKind::Load => "load",
            ElementKind::Shunt => "shunt",
            ElementKind::Branch => "branch",
        }
    }

    /// All kinds that carry a substation reference and therefore receive a
    /// propagated voltage level.
    pub fn substation_scoped() -> [ElementKind; 5] {
        [
            ElementKind::Bus,
            ElementKind::Generator,
            ElementKind::Load,
            ElementKind::Shunt,
            ElementKind::Branch,
        ]
    }
}

/// Static attributes of one element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementRecord {
    pub num: i64,
    pub name: String,
    /// Nominal voltage in kV; only substations carry it natively.
    pub nominal_kv: Option<f64>,
    pub vmin_kv: Option<f64>,
    pub vmax_kv: Option<f64>,
    /// Owning substation number, when the element has one.
    pub substation: Option<i64>,
    /// Voltage level in kV, propagated from the owning substation.
    /// `None` when the referenced substation is absent from the catalog.
    pub voltage_level_kv: Option<f64>,
    /// Branch impedances; absent for every other kind.
    pub resistance: Option<f64>,
    pub reactance: Option<f64>,
}

/// Read-only catalog of static element attributes for one base case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementsCatalog {
    elements: HashMap<ElementKind, HashMap<i64, ElementRecord>>,
    /// No-contingency-case bus voltage per substation, in kV.
    recorded_voltages: HashMap<i64, f64>,
    /// No-contingency-case tap position per transformer.
    tap_baseline: HashMap<String, i64>,
}

impl ElementsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ElementKind, record: ElementRecord) {
        self.elements
            .entry(kind)
            .or_default()
            .insert(record.num, record);
    }

    pub fn get(&self, kind: ElementKind, num: i64) -> Option<&ElementRecord> {
        self.elements.get(&kind).and_then(|map| map.get(&num))
    }

    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.get(&kind).map_or(0, HashMap::len)
    }

    /// Propagate substation nominal voltages to every substation-scoped
    /// element. Elements whose substation reference misses keep `None`.
    pub fn propagate_voltage_levels(&mut self) {
        let substation_kv: HashMap<i64, f64> = self
            .elements
            .get(&ElementKind::Substation)
            .map(|subs| {
                subs.values()
                    .filter_map(|s| s.nominal_kv.map(|kv| (s.num, kv)))
                    .collect()
            })
            .unwrap_or_default();

        for kind in ElementKind::substation_scoped() {
            if let Some(map) = self.elements.get_mut(&kind) {
                for record in map.values_mut() {
                    record.voltage_level_kv = record
                        .substation
                        .and_then(|num| substation_kv.get(&num).copied());
                }
            }
        }
    }

    /// Voltage level of one element, when known.
    pub fn voltage_level(&self, kind: ElementKind, num: i64) -> Option<f64> {
        self.get(kind, num).and_then(|r| r.voltage_level_kv)
    }

    pub fn set_recorded_voltage(&mut self, substation: i64, kv: f64) {
        self.recorded_voltages.insert(substation, kv);
    }

    /// No-contingency-case bus voltage for a substation, when recorded.
    pub fn recorded_voltage(&self, substation: i64) -> Option<f64> {
        self.recorded_voltages.get(&substation).copied()
    }

    pub fn set_tap_baseline(&mut self, transformer: &str, position: i64) {
        self.tap_baseline.insert(transformer.to_string(), position);
    }

    /// No-contingency-case tap position for a transformer, when recorded.
    pub fn tap_baseline(&self, transformer: &str) -> Option<i64> {
        self.tap_baseline.get(transformer).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substation(num: i64, kv: f64) -> ElementRecord {
        ElementRecord {
            num,
            name: format!("SUB{num}"),
            nominal_kv: Some(kv),
            vmin_kv: Some(kv * 0.9),
            vmax_kv: Some(kv * 1.1),
            ..ElementRecord::default()
        }
    }

    #[test]
    fn voltage_level_propagates_from_substation() {
        let mut catalog = ElementsCatalog::new();
        catalog.insert(ElementKind::Substation, substation(1, 225.0));
        catalog.insert(
            ElementKind::Generator,
            ElementRecord {
                num: 7,
                name: "GEN7".into(),
                substation: Some(1),
                ..ElementRecord::default()
            },
        );
        catalog.propagate_voltage_levels();

        assert_eq!(catalog.voltage_level(ElementKind::Generator, 7), Some(225.0));
    }

    #[test]
    fn missing_substation_degrades_to_none() {
        let mut catalog = ElementsCatalog::new();
        catalog.insert(
            ElementKind::Load,
            ElementRecord {
                num: 3,
                name: "LOAD3".into(),
                substation: Some(99),
                ..ElementRecord::default()
            },
        );
        catalog.propagate_voltage_levels();

        // Substation 99 does not exist; the level stays unknown, no error.
        assert_eq!(catalog.voltage_level(ElementKind::Load, 3), None);
    }

    #[test]
    fn recorded_voltage_and_tap_baseline_lookup() {
        let mut catalog = ElementsCatalog::new();
        catalog.set_recorded_voltage(4, 238.1);
        catalog.set_tap_baseline("T1", 8);

        assert_eq!(catalog.recorded_voltage(4), Some(238.1));
        assert_eq!(catalog.recorded_voltage(5), None);
        assert_eq!(catalog.tap_baseline("T1"), Some(8));
        assert_eq!(catalog.tap_baseline("T2"), None);
    }
}
