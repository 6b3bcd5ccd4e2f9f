//! Ranking and top-K selection.
//!
//! Produces a total order over all records, converged and non-converged
//! together, from most to least interesting. "Divergence" ranks worst of
//! all: the cheap simulator itself failing to converge is maximally
//! suspicious. Every other status label ranks at the bottom: those runs
//! are uninformative rather than severe.

use anyhow::{anyhow, Result};
use gcs_core::{ContingencyRecord, FinalScore, ScreeningConfig, SolverOutcome};

/// Sort key for one final score. Numeric scores are used verbatim;
/// "Divergence" maps to the configured constant above any real score;
/// every other label maps to 0.
pub fn sort_key(score: &FinalScore, config: &ScreeningConfig) -> f64 {
    match score {
        FinalScore::Value(v) => *v,
        FinalScore::Status(SolverOutcome::Divergence) => config.divergence_sort_key,
        FinalScore::Status(_) => 0.0,
    }
}

/// Sort records from worst-ranked (most severe) to least. The sort is
/// stable, so tied records keep their input order. Every record must
/// already carry a final score; an unscored record is a pipeline defect
/// and fails the case rather than silently dropping out.
pub fn rank_records(
    mut records: Vec<ContingencyRecord>,
    config: &ScreeningConfig,
) -> Result<Vec<ContingencyRecord>> {
    for record in &records {
        if record.final_score.is_none() {
            return Err(anyhow!(
                "contingency '{}' reached ranking without a final score",
                record.id
            ));
        }
    }
    records.sort_by(|a, b| {
        let ka = a.final_score.as_ref().map_or(0.0, |s| sort_key(s, config));
        let kb = b.final_score.as_ref().map_or(0.0, |s| sort_key(s, config));
        kb.total_cmp(&ka)
    });
    Ok(records)
}

/// Select the first `n_replay` records for re-simulation. -1, or a count
/// exceeding the list, takes everything.
pub fn select_top(ranked: &[ContingencyRecord], n_replay: i64) -> &[ContingencyRecord] {
    if n_replay < 0 {
        return ranked;
    }
    let count = (n_replay as usize).min(ranked.len());
    &ranked[..count]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_core::ContingencyKind;

    fn scored(id: &str, score: FinalScore) -> ContingencyRecord {
        let mut record =
            ContingencyRecord::new(id, format!("DEF_{id}"), ContingencyKind::Branch, vec![1]);
        record.outcome = match &score {
            FinalScore::Value(_) => SolverOutcome::Converged,
            FinalScore::Status(outcome) => *outcome,
        };
        record.set_final_score(score);
        record
    }

    #[test]
    fn divergence_outranks_every_numeric_score() {
        let config = ScreeningConfig::default();
        let records = vec![
            scored("A", FinalScore::Value(120.5)),
            scored("B", FinalScore::Status(SolverOutcome::Divergence)),
            scored("C", FinalScore::Value(85.0)),
        ];
        let ranked = rank_records(records, &config).unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, ["B", "A", "C"]);

        let top = select_top(&ranked, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "B");
        assert_eq!(top[1].id, "A");
    }

    #[test]
    fn other_labels_sink_below_numeric_scores() {
        let config = ScreeningConfig::default();
        let records = vec![
            scored("T", FinalScore::Status(SolverOutcome::Timeout)),
            scored("A", FinalScore::Value(0.5)),
        ];
        let ranked = rank_records(records, &config).unwrap();
        assert_eq!(ranked[0].id, "A");
        assert_eq!(ranked[1].id, "T");
    }

    #[test]
    fn sort_keys_form_a_total_order() {
        let config = ScreeningConfig::default();
        let divergence = sort_key(
            &FinalScore::Status(SolverOutcome::Divergence),
            &config,
        );
        let timeout = sort_key(&FinalScore::Status(SolverOutcome::Timeout), &config);
        let numeric = sort_key(&FinalScore::Value(1.0e9), &config);

        assert!(divergence > numeric);
        assert!(numeric > timeout);
        assert_eq!(timeout, 0.0);
    }

    #[test]
    fn ties_keep_input_order() {
        let config = ScreeningConfig::default();
        let records = vec![
            scored("first", FinalScore::Value(10.0)),
            scored("second", FinalScore::Value(10.0)),
        ];
        let ranked = rank_records(records, &config).unwrap();
        assert_eq!(ranked[0].id, "first");
        assert_eq!(ranked[1].id, "second");
    }

    #[test]
    fn select_top_minus_one_and_overflow_take_all() {
        let config = ScreeningConfig::default();
        let records = vec![
            scored("A", FinalScore::Value(3.0)),
            scored("B", FinalScore::Value(2.0)),
        ];
        let ranked = rank_records(records, &config).unwrap();
        assert_eq!(select_top(&ranked, -1).len(), 2);
        assert_eq!(select_top(&ranked, 10).len(), 2);
        assert_eq!(select_top(&ranked, 0).len(), 0);
    }

    #[test]
    fn unscored_record_fails_ranking() {
        let config = ScreeningConfig::default();
        let record =
            ContingencyRecord::new("X", "DEF_X", ContingencyKind::Load, vec![1]);
        assert!(rank_records(vec![record], &config).is_err());
    }
}
