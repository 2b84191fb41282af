//! Command-line interface for kwforge.
//!
//! Provides the `extract` pipeline command and the `crawl` cache-priming
//! command.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
