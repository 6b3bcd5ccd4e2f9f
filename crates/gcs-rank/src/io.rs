//! CSV outputs: the feature table, the excluded-contingency report and the
//! cross-simulator diff table. All files are semicolon-delimited, one row
//! per contingency, indexed by contingency id (features) or name (diff).

use crate::diff::DiffRecord;
use crate::features::{FeatureRow, FeatureTable};
use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Feature CSV read back from disk. The score column is present when the
/// file was written with per-contingency scores (retraining exports).
#[derive(Debug)]
pub struct FeatureCsv {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
    pub scores: Option<HashMap<String, f64>>,
}

const SCORE_COLUMN: &str = "score";

/// Write the feature table. `scores` adds the trailing score column used
/// by offline retraining.
pub fn write_feature_csv(
    table: &FeatureTable,
    path: &Path,
    scores: Option<&HashMap<String, f64>>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating feature CSV '{}'", path.display()))?;

    let mut header: Vec<&str> = vec!["id", "name"];
    header.extend(table.columns.iter().map(String::as_str));
    if scores.is_some() {
        header.push(SCORE_COLUMN);
    }
    writer.write_record(&header).context("writing feature CSV header")?;

    for row in &table.rows {
        let mut fields = vec![row.id.clone(), row.name.clone()];
        fields.extend(row.values.iter().map(|v| format!("{v}")));
        if let Some(scores) = scores {
            let score = scores.get(&row.id).ok_or_else(|| {
                anyhow!("no score for contingency '{}' in feature CSV export", row.id)
            })?;
            fields.push(format!("{score}"));
        }
        writer
            .write_record(&fields)
            .with_context(|| format!("writing feature CSV row '{}'", row.id))?;
    }

    writer.flush().context("flushing feature CSV")?;
    Ok(())
}

/// Read a feature CSV back, for retraining exports and the diff merge.
pub fn read_feature_csv(path: &Path) -> Result<FeatureCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("opening feature CSV '{}'", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .context("reading feature CSV header")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if header.len() < 2 || header[0] != "id" || header[1] != "name" {
        return Err(anyhow!(
            "feature CSV '{}' must start with 'id;name' columns",
            path.display()
        ));
    }
    let has_scores = header.last().map(String::as_str) == Some(SCORE_COLUMN);
    let value_end = if has_scores {
        header.len() - 1
    } else {
        header.len()
    };
    let columns: Vec<String> = header[2..value_end].to_vec();

    let mut rows = Vec::new();
    let mut scores: HashMap<String, f64> = HashMap::new();
    for record in reader.records() {
        let record = record.context("reading feature CSV row")?;
        let id = record
            .get(0)
            .ok_or_else(|| anyhow!("feature CSV row is missing the id field"))?
            .to_string();
        let name = record
            .get(1)
            .ok_or_else(|| anyhow!("feature CSV row '{id}' is missing the name field"))?
            .to_string();
        let mut values = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let raw = record.get(2 + index).ok_or_else(|| {
                anyhow!("feature CSV row '{id}' is missing column '{column}'")
            })?;
            values.push(raw.parse().with_context(|| {
                format!("feature CSV row '{id}' column '{column}' is not a number: '{raw}'")
            })?);
        }
        if has_scores {
            let raw = record
                .get(value_end)
                .ok_or_else(|| anyhow!("feature CSV row '{id}' is missing the score field"))?;
            scores.insert(
                name.clone(),
                raw.parse()
                    .with_context(|| format!("feature CSV row '{id}' score is not a number"))?,
            );
        }
        rows.push(FeatureRow { id, name, values });
    }

    Ok(FeatureCsv {
        columns,
        rows,
        scores: has_scores.then_some(scores),
    })
}

/// Write the excluded-contingency report: id → status label.
pub fn write_excluded_report(excluded: &BTreeMap<String, String>, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating excluded report '{}'", path.display()))?;
    writer
        .write_record(["id", "status"])
        .context("writing excluded report header")?;
    for (id, status) in excluded {
        writer
            .write_record([id.as_str(), status.as_str()])
            .with_context(|| format!("writing excluded report row '{id}'"))?;
    }
    writer.flush().context("flushing excluded report")?;
    Ok(())
}

/// Write the cross-simulator diff table.
pub fn write_diff_csv(diffs: &[DiffRecord], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating diff CSV '{}'", path.display()))?;
    writer
        .write_record(["name", "category", "diff_value"])
        .context("writing diff CSV header")?;
    for diff in diffs {
        let value = format!("{}", diff.diff_value);
        writer
            .write_record([diff.name.as_str(), diff.category.as_str(), value.as_str()])
            .with_context(|| format!("writing diff CSV row '{}'", diff.name))?;
    }
    writer.flush().context("flushing diff CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ConvergenceCategory;
    use crate::features::feature_columns;
    use gcs_core::FeatureMode;
    use tempfile::TempDir;

    fn table() -> FeatureTable {
        FeatureTable {
            mode: FeatureMode::Discrete,
            tap_changers: false,
            columns: feature_columns(FeatureMode::Discrete, false),
            rows: vec![
                FeatureRow {
                    id: "12".into(),
                    name: "DEF_BRANCH_12".into(),
                    values: vec![1.0, 2.0, 0.0, 1.0, 3.0, 1.0, 12.0, 1.0],
                },
                FeatureRow {
                    id: "7".into(),
                    name: "DEF_GEN_7".into(),
                    values: vec![0.5, 0.25, 1.0, 0.0, 0.0, 0.0, 9.0, 1.0],
                },
            ],
            excluded: BTreeMap::new(),
        }
    }

    #[test]
    fn feature_csv_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("features.csv");
        let table = table();

        write_feature_csv(&table, &path, None).unwrap();
        let read = read_feature_csv(&path).unwrap();

        assert_eq!(read.columns, table.columns);
        assert_eq!(read.rows.len(), table.rows.len());
        for (written, read) in table.rows.iter().zip(&read.rows) {
            assert_eq!(written.id, read.id);
            assert_eq!(written.values, read.values);
        }
        assert!(read.scores.is_none());
    }

    #[test]
    fn feature_csv_with_scores_exposes_them_by_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("features.csv");
        let table = table();
        let scores = HashMap::from([
            ("12".to_string(), 120.5),
            ("7".to_string(), 85.0),
        ]);

        write_feature_csv(&table, &path, Some(&scores)).unwrap();
        let read = read_feature_csv(&path).unwrap();
        let read_scores = read.scores.unwrap();
        assert_eq!(read_scores.get("DEF_BRANCH_12"), Some(&120.5));
        assert_eq!(read_scores.get("DEF_GEN_7"), Some(&85.0));
    }

    #[test]
    fn diff_csv_writes_categories_by_wire_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("diff.csv");
        let diffs = vec![DiffRecord {
            name: "DEF_BRANCH_12".into(),
            category: ConvergenceCategory::Dwo,
            diff_value: 100_000.0,
            unscored: Vec::new(),
            tap_deltas: Vec::new(),
        }];

        write_diff_csv(&diffs, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("name;category;diff_value"));
        assert!(text.contains("DEF_BRANCH_12;DWO;100000"));
    }

    #[test]
    fn excluded_report_lists_labels() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("excluded.csv");
        let excluded = BTreeMap::from([
            ("7".to_string(), "Divergence".to_string()),
            ("9".to_string(), "Timeout".to_string()),
        ]);

        write_excluded_report(&excluded, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("7;Divergence"));
        assert!(text.contains("9;Timeout"));
    }
}
