//! Command-line interface components
//!
//! This module contains CLI-specific code for elskip_data, including argument
//! parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, EnrichArgs, GlobalArgs, ValidateArgs};
pub use commands::{
    handle_aggregate, handle_enrich, handle_index, handle_summary, handle_validate,
};
pub use progress::{ProgressConfig, ProgressDisplay};
