//! Core application logic for elskip_data
//!
//! Grid collections flow through normalization, region enrichment and index
//! building; MarU extracts flow through the tabular aggregation. Validation
//! and the summary are read-only passes over the grid directory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use elskip_data::app::{
//!     FeatureEnricher, GridPaths, GridPipeline, IndexBuilder, LookupConfig, NoProgress,
//!     RegionLookupClient,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LookupConfig::default();
//! let client = RegionLookupClient::new(&config)?;
//! let pipeline = GridPipeline::new(
//!     FeatureEnricher::new(client, config.inter_call_delay),
//!     IndexBuilder::default(),
//!     GridPaths::under(Path::new("data")),
//! );
//!
//! let (stats, index) = pipeline.run(&mut NoProgress).await?;
//! println!(
//!     "{} of {} features enriched, index lists {} files",
//!     stats.features.enriched_features, stats.features.total_features, index.total_files
//! );
//! # Ok(())
//! # }
//! ```

pub mod enrich;
pub mod geometry;
pub mod index;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod store;
pub mod summary;
pub mod tabular;
pub mod validate;

// Re-export main public API
pub use enrich::{EnrichmentReport, FeatureEnricher};
pub use geometry::{resolve_point, Geometry};
pub use index::{GridIndex, IndexBuilder, IndexConfig};
pub use lookup::{LookupConfig, LookupOutcome, RegionLookup, RegionLookupClient};
pub use models::{Collection, Coordinate, DocumentShape, Feature, RegionRecord};
pub use normalize::normalize;
pub use pipeline::{
    aggregate_extracts, rebuild_index, AggregateOutcome, GridPaths, GridPipeline, IndexOutcome,
    NoProgress, ProgressObserver, RunStats, TabularPaths,
};
pub use store::FailedSource;
pub use summary::GridSummary;
pub use tabular::{TabularAggregate, TabularAggregator, TabularConfig, TabularRecord};
pub use validate::{validate_document, Findings, ValidationReport};
