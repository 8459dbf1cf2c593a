//! Prelude module for elskip_data
//!
//! Re-exports the items most integrations need, so that a single
//! `use elskip_data::prelude::*;` is enough for typical usage.
//!
//! # Usage
//!
//! ```rust,no_run
//! use elskip_data::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let aggregator = TabularAggregator::new(config.tabular.clone());
//!     let outcome = aggregate_extracts(&config.paths.tabular_paths(), &aggregator).await?;
//!     println!("{} aggregated rows", outcome.aggregated_records);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::config::AppConfig;

// Grid pipeline
pub use crate::app::{
    normalize, Collection, Coordinate, EnrichmentReport, Feature, FeatureEnricher, GridIndex,
    GridPaths, GridPipeline, IndexBuilder, LookupConfig, LookupOutcome, NoProgress,
    RegionLookup, RegionLookupClient, RegionRecord, RunStats,
};

// Tabular pipeline
pub use crate::app::{aggregate_extracts, TabularAggregate, TabularAggregator, TabularPaths};

// Read-only passes
pub use crate::app::{validate_document, GridSummary, ValidationReport};
