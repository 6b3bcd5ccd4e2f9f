//! # gcs-core: Contingency Screening Core Model
//!
//! Data model shared by the whole screening pipeline: the static elements
//! catalog, per-contingency fact records, the closed solver-outcome
//! enumeration, and the run configuration.
//!
//! ## Design Philosophy
//!
//! - **One fact record per contingency.** A [`ContingencyRecord`] is created
//!   when its definition is discovered, populated by merging in results,
//!   scored once, and never mutated after ranking.
//! - **Non-convergence is an outcome, not an error.** [`SolverOutcome`] is a
//!   closed enumeration; every contingency that enters the pipeline leaves
//!   it with either a numeric score or a status label.
//! - **No ambient globals.** Penalty constants, sentinels and thresholds
//!   travel in [`ScreeningConfig`] so tests can vary them per case.
//! - **Sentinels die at the boundary.** Disconnected-element wire values are
//!   converted to `Option` fields during extraction; nothing downstream
//!   compares against magic numbers.
//!
//! ## Integration with gcs-io / gcs-rank
//!
//! The gcs-io crate builds the catalog and the records from the simulator
//! documents; gcs-rank consumes them read-only to produce features, scores
//! and rankings.

pub mod catalog;
pub mod config;
pub mod error;
pub mod outcome;
pub mod record;

pub use catalog::{ElementKind, ElementRecord, ElementsCatalog};
pub use config::{FeatureMode, ScreeningConfig};
pub use error::{ScreenError, ScreenResult};
pub use outcome::{FinalScore, SolverOutcome};
pub use record::{
    CoefReportEntry, ContingencyKind, ContingencyRecord, GeneratorConstraint,
    GeneratorConstraintKind, LimitConstraint, LoadingExcursion, NodeResult, TapChangerDelta,
    TapKind, TapMovement, VoltageExcursion,
};
