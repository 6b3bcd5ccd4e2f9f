//! End-to-end `gcs screen` runs against a small case on disk.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const STATIC_DOC: &str = r#"
    <network>
      <substations>
        <substation num="1" name="ALPHA" vnom="225"/>
      </substations>
      <buses>
        <bus num="4" name="ALPHA.B1" substation="1" vinit="238.1"/>
      </buses>
      <branches>
        <branch num="12" name="LINE_12" substation="1"/>
      </branches>
      <contingencies>
        <contingency id="A" name="DEF_A" kind="1"><element num="12"/></contingency>
        <contingency id="B" name="DEF_B" kind="2"><element num="7"/></contingency>
      </contingencies>
    </network>
"#;

const RESULTS_DOC: &str = r#"
    <results>
      <contingency id="A" status="0" iterations="15" duration="0.9">
        <loadings> <loading branch="12" value="108.0"/> </loadings>
      </contingency>
      <contingency id="B" status="1"/>
    </results>
"#;

const WEIGHTS: &str = r#"{
  "MIN_VOLT": 1.0, "MAX_VOLT": 1.0, "N_ITER": 1.0, "AFFECTED_ELEM": 1.0,
  "CONSTR_GEN_Q": 1.0, "CONSTR_GEN_U": 1.0, "CONSTR_VOLT": 1.0,
  "CONSTR_FLOW": 1.0, "RES_NODE": 1.0, "MAX_FLOW": 1.0, "COEF_REPORT": 1.0,
  "INTERCEPTION": 0.0
}"#;

fn write_case(tmp: &TempDir) {
    fs::write(tmp.path().join("network.xml"), STATIC_DOC).unwrap();
    fs::write(tmp.path().join("results.xml"), RESULTS_DOC).unwrap();
    fs::write(tmp.path().join("weights.json"), WEIGHTS).unwrap();
}

#[test]
fn screen_writes_report_features_and_manifest() {
    let tmp = TempDir::new().unwrap();
    write_case(&tmp);
    let out_dir = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("gcs").unwrap();
    cmd.args([
        "screen",
        "--static-file",
        tmp.path().join("network.xml").to_str().unwrap(),
        "--results",
        tmp.path().join("results.xml").to_str().unwrap(),
        "--weights",
        tmp.path().join("weights.json").to_str().unwrap(),
        "--replay",
        "1",
        "--out-dir",
        out_dir.to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("DEF_B").and(predicate::str::contains("Divergence")));

    assert!(out_dir.join("ranking.txt").is_file());
    assert!(out_dir.join("features.csv").is_file());
    assert!(out_dir.join("excluded.csv").is_file());
    assert!(out_dir.join("run_manifest.json").is_file());

    // DEF_B diverged, so it ranks first and is the one selected for replay.
    let manifest = fs::read_to_string(out_dir.join("run_manifest.json")).unwrap();
    assert!(manifest.contains(r#""DEF_B""#));
    assert!(!manifest.contains(r#""DEF_A""#));
}

#[test]
fn invalid_score_type_terminates_with_an_error() {
    let tmp = TempDir::new().unwrap();
    write_case(&tmp);

    let mut cmd = Command::cargo_bin("gcs").unwrap();
    cmd.args([
        "screen",
        "--static-file",
        tmp.path().join("network.xml").to_str().unwrap(),
        "--results",
        tmp.path().join("results.xml").to_str().unwrap(),
        "--score-type",
        "7",
    ]);
    cmd.assert().failure();
}
