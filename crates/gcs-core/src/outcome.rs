//! Solver outcomes and final scores.
//!
//! The cheap simulator reports one integer status per contingency. Status 0
//! means the solver converged to a normal solution; every other code is a
//! distinct first-class outcome, not an error. The enumeration is closed:
//! codes outside the published range decode to [`SolverOutcome::Unknown`]
//! at the wire boundary and no catch-all survives past it.

use serde::{Deserialize, Serialize};

/// Closed enumeration of solver outcomes for one contingency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverOutcome {
    /// Status 0: normal solution, the contingency gets a numeric score.
    Converged,
    /// Status 1: the solver itself diverged. Ranked as the worst outcome.
    Divergence,
    /// Status 2
    GenericFail,
    /// Status 3
    NoComputation,
    /// Status 4
    Interrupted,
    /// Status 5
    NoOutput,
    /// Status 6
    NonrealisticSolution,
    /// Status 7
    PowerBalanceFail,
    /// Status 8
    Timeout,
    /// Any status outside 0..=8.
    Unknown,
}

impl SolverOutcome {
    /// Decode a wire status code. This is the only place a catch-all exists;
    /// past this boundary the enum is matched exhaustively.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SolverOutcome::Converged,
            1 => SolverOutcome::Divergence,
            2 => SolverOutcome::GenericFail,
            3 => SolverOutcome::NoComputation,
            4 => SolverOutcome::Interrupted,
            5 => SolverOutcome::NoOutput,
            6 => SolverOutcome::NonrealisticSolution,
            7 => SolverOutcome::PowerBalanceFail,
            8 => SolverOutcome::Timeout,
            _ => SolverOutcome::Unknown,
        }
    }

    /// Status label used wherever a non-numeric score is reported.
    /// [`SolverOutcome::Converged`] has no label; converged contingencies
    /// carry a numeric score instead.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            SolverOutcome::Converged => None,
            SolverOutcome::Divergence => Some("Divergence"),
            SolverOutcome::GenericFail => Some("Generic fail"),
            SolverOutcome::NoComputation => Some("No computation"),
            SolverOutcome::Interrupted => Some("Interrupted"),
            SolverOutcome::NoOutput => Some("No output"),
            SolverOutcome::NonrealisticSolution => Some("Nonrealistic solution"),
            SolverOutcome::PowerBalanceFail => Some("Power balance fail"),
            SolverOutcome::Timeout => Some("Timeout"),
            SolverOutcome::Unknown => Some("Final state unknown"),
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, SolverOutcome::Converged)
    }
}

/// Final score of a contingency: a finite number for converged contingencies,
/// a status label for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinalScore {
    /// Numeric severity score, higher = more severe.
    Value(f64),
    /// Non-converged outcome; never `SolverOutcome::Converged`.
    Status(SolverOutcome),
}

impl FinalScore {
    /// Render the score the way reports print it: the number for converged
    /// contingencies, the status label otherwise.
    pub fn display(&self) -> String {
        match self {
            FinalScore::Value(v) => format!("{v}"),
            FinalScore::Status(outcome) => {
                outcome.label().unwrap_or("Final state unknown").to_string()
            }
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            FinalScore::Value(v) => Some(*v),
            FinalScore::Status(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_one_to_one() {
        assert_eq!(SolverOutcome::from_code(0), SolverOutcome::Converged);
        assert_eq!(SolverOutcome::from_code(1), SolverOutcome::Divergence);
        assert_eq!(SolverOutcome::from_code(8), SolverOutcome::Timeout);
        assert_eq!(SolverOutcome::from_code(9), SolverOutcome::Unknown);
        assert_eq!(SolverOutcome::from_code(-3), SolverOutcome::Unknown);
    }

    #[test]
    fn labels_are_the_published_set() {
        let expected = [
            (SolverOutcome::Divergence, "Divergence"),
            (SolverOutcome::GenericFail, "Generic fail"),
            (SolverOutcome::NoComputation, "No computation"),
            (SolverOutcome::Interrupted, "Interrupted"),
            (SolverOutcome::NoOutput, "No output"),
            (SolverOutcome::NonrealisticSolution, "Nonrealistic solution"),
            (SolverOutcome::PowerBalanceFail, "Power balance fail"),
            (SolverOutcome::Timeout, "Timeout"),
            (SolverOutcome::Unknown, "Final state unknown"),
        ];
        for (outcome, label) in expected {
            assert_eq!(outcome.label(), Some(label));
        }
        assert_eq!(SolverOutcome::Converged.label(), None);
    }

    #[test]
    fn final_score_display() {
        assert_eq!(FinalScore::Value(120.5).display(), "120.5");
        assert_eq!(
            FinalScore::Status(SolverOutcome::Divergence).display(),
            "Divergence"
        );
    }
}
