//! Command-line application support.
//!
//! This module provides the CLI definition, statistics printing for results
//! runs and the one-line renderings of probes and measurements.

pub mod cli;
pub mod output;
pub mod statistics;

// Re-export public API
pub use cli::{Cli, Command, ProbesArgs, ResultsArgs};
pub use output::{format_measurement, format_probe, probe_id_list};
pub use statistics::{print_error_statistics, print_result_summary};
