//! MarU extract aggregation
//!
//! Spreadsheet extracts are read with calamine into [`TabularRecord`]s, all
//! extracts are concatenated, and [`TabularAggregator`] folds them into one
//! row per distinct combination of the six categorical dimensions plus
//! per-year totals and filter facets for the dashboard.
//!
//! ```text
//! *.xlsx ──► reader ──► Vec<TabularRecord> ──► TabularAggregator ──► TabularAggregate
//! ```

pub mod aggregate;
pub mod config;
pub mod reader;
pub mod types;

pub use aggregate::TabularAggregator;
pub use config::TabularConfig;
pub use reader::{discover_extracts, load_extract, read_extract, records_from_rows};
pub use types::{
    AggregatedRow, Category, Facets, Measures, PeriodTotal, TabularAggregate, TabularMetadata,
    TabularRecord, DIMENSIONS, MEASURES,
};
