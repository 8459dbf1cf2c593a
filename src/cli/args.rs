//! Command-line argument parsing for elskip_data
//!
//! One subcommand per pipeline. None of them take required arguments; the
//! directory layout comes from the configuration and `--data-dir`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// elskip_data - dashboard data pipelines for electric shipping
#[derive(Parser, Debug)]
#[command(
    name = "elskip_data",
    version,
    about = "Prepare grid capacity and MarU emissions data for the dashboard",
    long_about = "Enriches grid capacity collections with municipality and county, rebuilds the \
cross-source grid index, aggregates MarU emission extracts and validates collection files."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data root directory (overrides config and ELSKIP_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add municipality and county to grid features, then rebuild the index
    Enrich(EnrichArgs),

    /// Rebuild the grid index from the collections on disk
    Index,

    /// Aggregate MarU spreadsheet extracts
    Aggregate,

    /// Check grid collections for structural problems
    Validate(ValidateArgs),

    /// Show feature counts and capacity statistics per source
    Summary,
}

/// Arguments for the enrich command
#[derive(Args, Debug, Clone, Default)]
pub struct EnrichArgs {
    /// Do not rebuild the index after enrichment
    #[arg(long)]
    pub skip_index: bool,
}

/// Arguments for the validate command
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Write the full report as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// `configured` applies when no verbosity flag is given.
    pub fn log_level(&self, configured: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            configured
        }
    }
}
