//! Screening run configuration.
//!
//! Every constant that tunes the pipeline lives here and is passed
//! explicitly into the component that needs it, so tests can vary them per
//! case instead of patching globals.

use serde::{Deserialize, Serialize};

/// Which feature shape a table (and any model consuming it) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    /// Raw violation counts.
    Discrete,
    /// Magnitude-weighted aggregates.
    Continuous,
}

impl FeatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureMode::Discrete => "discrete",
            FeatureMode::Continuous => "continuous",
        }
    }
}

/// Configuration shared across the screening pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Tap-changer modeling enabled for this run.
    pub tap_changers: bool,
    /// Penalty a tap movement contributes when it hit its stop limiter.
    pub tap_stop_penalty: f64,
    /// Flat contribution of a constraint whose temporization is permanent.
    pub permanent_tempo_score: f64,
    /// Wire values of `tempo` meaning "permanent".
    pub permanent_tempo_sentinels: [f64; 2],
    /// Cap on the `10000 / tempo` term of the temporization score.
    pub tempo_score_cap: f64,
    /// Sort key assigned to "Divergence"; strictly greater than any real
    /// numeric score so a diverged cheap run ranks worst of all.
    pub divergence_sort_key: f64,
    /// Diff penalty when exactly one simulator converged.
    pub one_sided_penalty: f64,
    /// Diff penalty when neither simulator converged.
    pub both_diverged_penalty: f64,
    /// How many top-ranked contingencies to re-simulate; -1 takes all.
    pub n_replay: i64,
    /// Worker threads for per-contingency scoring; 0 = one per CPU.
    pub threads: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            tap_changers: false,
            tap_stop_penalty: 20.0,
            permanent_tempo_score: 5.0,
            permanent_tempo_sentinels: [99999.0, 9999.0],
            tempo_score_cap: 100.0,
            divergence_sort_key: 1.0e12,
            one_sided_penalty: 100_000.0,
            both_diverged_penalty: 50_000.0,
            n_replay: 25,
            threads: 0,
        }
    }
}

impl ScreeningConfig {
    pub fn is_permanent_tempo(&self, tempo: f64) -> bool {
        self.permanent_tempo_sentinels.contains(&tempo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_constants() {
        let config = ScreeningConfig::default();
        assert_eq!(config.tap_stop_penalty, 20.0);
        assert_eq!(config.one_sided_penalty, 100_000.0);
        assert_eq!(config.both_diverged_penalty, 50_000.0);
        assert_eq!(config.n_replay, 25);
        assert!(config.is_permanent_tempo(99999.0));
        assert!(config.is_permanent_tempo(9999.0));
        assert!(!config.is_permanent_tempo(300.0));
    }
}
