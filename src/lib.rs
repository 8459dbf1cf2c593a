//! elskip_data Library
//!
//! Data preparation for the electric shipping dashboard: region enrichment of
//! grid capacity collections, a cross-source grid index, MarU emission
//! aggregation and structural validation of the grid files.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use errors::{AppError, Result};
