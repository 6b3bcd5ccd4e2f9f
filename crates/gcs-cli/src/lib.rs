//! # gcs-cli: The `gcs` Command-Line Interface
//!
//! Thin dispatch over the screening pipeline: `screen` runs extraction,
//! scoring, ranking and selection for one case; `features` exports the
//! feature table alone; `diff` compares replay results against a finished
//! screening run.

pub mod cli;
pub mod commands;
