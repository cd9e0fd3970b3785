//! Command-line interface for pulley-forge.
//!
//! Provides commands for question generation, per-video sampling, dataset
//! splitting and baseline evaluation.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
