//! # gcs-io: Simulator Document I/O
//!
//! Parsers for the two simulators' result artifacts and the run manifest.
//!
//! - [`static_doc`] - the cheap simulator's base-case description: elements
//!   catalog and contingency definitions.
//! - [`results_doc`] - the cheap simulator's results: per-contingency solver
//!   outcome, constraint lists, surveillance voltage ranges, node results
//!   and tap movements, merged into the records built from the definitions.
//! - [`replay_dir`] - the expensive simulator's per-contingency replay
//!   directories: status, constraints, event timeline, final-state taps.
//! - [`manifest`] - the JSON run manifest linking a screening run to its
//!   outputs.
//!
//! Extraction fails the whole case on structural errors (duplicate ids,
//! references to undefined contingencies, invalid kind codes); it never
//! recovers per contingency. Missing replay directories are the one
//! tolerated gap: they warn and skip, because a lost replay must not
//! invalidate the rest of the batch.

pub mod manifest;
pub mod replay_dir;
pub mod results_doc;
pub mod static_doc;
mod xml;

pub use manifest::{load_run_manifest, write_run_manifest, RunManifest};
pub use replay_dir::{
    read_replay_results, ReplayConstraint, ReplayConstraintKind, ReplayResult,
    STATUS_CONVERGENCE, STATUS_DIVERGENCE,
};
pub use results_doc::{
    load_results_document, merge_results, parse_results_document, ContingencyResults,
    ResultsDocument, VoltageRange,
};
pub use static_doc::{
    load_static_document, parse_static_document, ContingencyDefinition, StaticDocument,
};
