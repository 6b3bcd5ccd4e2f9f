//! End-to-end screening pipeline: parse the case documents, score, rank,
//! select, and export, all through the public APIs.

use gcs_core::{FeatureMode, FinalScore, ScreeningConfig, SolverOutcome};
use gcs_io::{merge_results, parse_results_document, parse_static_document};
use gcs_rank::{
    build_feature_table, rank_records, read_feature_csv, render_ranking_report, score_records,
    select_top, write_feature_csv, Scorer, WeightTable,
};
use tempfile::TempDir;

const STATIC_DOC: &str = r#"
    <network>
      <substations>
        <substation num="1" name="ALPHA" vnom="225"/>
        <substation num="2" name="BETA" vnom="400"/>
      </substations>
      <buses>
        <bus num="4" name="ALPHA.B1" substation="1" vinit="238.1"/>
      </buses>
      <generators>
        <generator num="7" name="GEN7" substation="1"/>
      </generators>
      <branches>
        <branch num="12" name="LINE_12" substation="1" resistance="1.2" reactance="11.5"/>
      </branches>
      <contingencies>
        <contingency id="A" name="DEF_A" kind="1"><element num="12"/></contingency>
        <contingency id="B" name="DEF_B" kind="2"><element num="7"/></contingency>
        <contingency id="C" name="DEF_C" kind="3"><element num="3"/></contingency>
      </contingencies>
    </network>
"#;

const RESULTS_DOC: &str = r#"
    <results>
      <contingency id="A" status="0" iterations="20" duration="1.2">
        <constraints>
          <flow element="12" before="95.0" after="112.0" limit="100.0" tempo="9999"/>
        </constraints>
        <loadings> <loading branch="12" value="112.0"/> </loadings>
      </contingency>
      <contingency id="B" status="1"/>
      <contingency id="C" status="0" iterations="8" duration="0.4"/>
      <surveillance>
        <voltage_range substation="1" vmin="210.0" vmax="244.5"
                       min_owner="A" max_owner="C"/>
      </surveillance>
    </results>
"#;

const WEIGHTS: &str = r#"{
  "MIN_VOLT": 10.0, "MAX_VOLT": 10.0, "N_ITER": 1.0, "AFFECTED_ELEM": 1.0,
  "CONSTR_GEN_Q": 1.0, "CONSTR_GEN_U": 1.0, "CONSTR_VOLT": 1.0,
  "CONSTR_FLOW": 1.0, "RES_NODE": 1.0, "MAX_FLOW": 1.0, "COEF_REPORT": 1.0,
  "INTERCEPTION": 0.5
}"#;

fn screen_case() -> (Vec<gcs_core::ContingencyRecord>, gcs_core::ElementsCatalog) {
    let config = ScreeningConfig::default();
    let case = parse_static_document(STATIC_DOC).unwrap();
    let mut records = case.empty_records();
    let results = parse_results_document(RESULTS_DOC).unwrap();
    merge_results(&mut records, results, config.tap_changers).unwrap();

    let weights = WeightTable::from_json(WEIGHTS, false).unwrap();
    score_records(&mut records, &case.catalog, &config, &Scorer::Weighted(weights)).unwrap();
    (records, case.catalog)
}

#[test]
fn diverged_contingency_ranks_first_and_is_selected() {
    let config = ScreeningConfig::default();
    let (records, _) = screen_case();

    // A converged with violations, B diverged, C converged quietly.
    assert_eq!(records[0].outcome, SolverOutcome::Converged);
    assert_eq!(records[1].outcome, SolverOutcome::Divergence);

    let ranked = rank_records(records, &config).unwrap();
    let order: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(order, ["B", "A", "C"]);

    let top = select_top(&ranked, 2);
    let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["DEF_B", "DEF_A"]);
}

#[test]
fn every_contingency_appears_with_score_or_label() {
    let (records, _) = screen_case();
    assert_eq!(records.len(), 3);
    for record in &records {
        match &record.final_score {
            Some(FinalScore::Value(v)) => assert!(v.is_finite()),
            Some(FinalScore::Status(outcome)) => assert!(outcome.label().is_some()),
            None => panic!("contingency '{}' left unscored", record.id),
        }
    }
}

#[test]
fn report_and_feature_csv_cover_the_case() {
    let config = ScreeningConfig::default();
    let (records, catalog) = screen_case();

    let table = build_feature_table(&records, &catalog, FeatureMode::Continuous, &config);
    // B diverged: excluded from the table, present in the side map.
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.excluded.get("B").map(String::as_str), Some("Divergence"));

    let tmp = TempDir::new().unwrap();
    let csv_path = tmp.path().join("features.csv");
    write_feature_csv(&table, &csv_path, None).unwrap();
    let read = read_feature_csv(&csv_path).unwrap();
    assert_eq!(read.columns, table.columns);
    for (written, read) in table.rows.iter().zip(&read.rows) {
        assert_eq!(written.values, read.values);
    }

    let ranked = rank_records(records, &config).unwrap();
    let report = render_ranking_report(&ranked, false).unwrap();
    assert!(report.contains("DEF_A"));
    assert!(report.contains("Divergence"));
}
