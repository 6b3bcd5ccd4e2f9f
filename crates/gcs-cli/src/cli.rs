use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Screen a case: extract, score, rank and select contingencies
    Screen {
        /// Path to the static network document
        #[arg(long)]
        static_file: PathBuf,
        /// Path to the cheap simulator's results document
        #[arg(long)]
        results: PathBuf,
        /// Enable tap-changer modeling
        #[arg(long)]
        tap_changers: bool,
        /// Scoring strategy: 1 = weighted formula, 2 = learned model
        #[arg(long, default_value_t = 1)]
        score_type: i64,
        /// Weight artifact for the weighted formula (score type 1)
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Model artifact for the learned model (score type 2)
        #[arg(long)]
        model: Option<PathBuf>,
        /// How many top-ranked contingencies to select; -1 selects all
        #[arg(long, default_value_t = 25)]
        replay: i64,
        /// Worker threads for scoring; 0 = one per CPU
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Dynamic database path handed through to the replay orchestrator
        #[arg(long)]
        dynamic_db: Option<PathBuf>,
        /// Input directories were already contingency-expanded
        #[arg(long)]
        pre_generated: bool,
        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
    },
    /// Export the feature table without ranking
    Features {
        /// Path to the static network document
        #[arg(long)]
        static_file: PathBuf,
        /// Path to the cheap simulator's results document
        #[arg(long)]
        results: PathBuf,
        /// Enable tap-changer modeling
        #[arg(long)]
        tap_changers: bool,
        /// Feature mode
        #[arg(long, value_enum, default_value = "continuous")]
        mode: FeatureModeArg,
        /// Output CSV path
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Compare replay results against the screening run
    Diff {
        /// Run manifest written by `gcs screen`
        #[arg(long)]
        manifest: PathBuf,
        /// Replay results directory (one sub-directory per contingency)
        #[arg(long)]
        replay_dir: PathBuf,
        /// Output CSV path
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FeatureModeArg {
    Discrete,
    Continuous,
}

impl From<FeatureModeArg> for gcs_core::FeatureMode {
    fn from(arg: FeatureModeArg) -> Self {
        match arg {
            FeatureModeArg::Discrete => gcs_core::FeatureMode::Discrete,
            FeatureModeArg::Continuous => gcs_core::FeatureMode::Continuous,
        }
    }
}
