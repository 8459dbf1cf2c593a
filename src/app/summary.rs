//! Read-only overview of the grid directory

use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

use crate::app::models::Collection;
use crate::app::store::{self, FailedSource};
use crate::constants::{files, index, paths, properties};
use crate::errors::SourceResult;

/// Feature count and publisher of one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOverview {
    pub file: String,
    pub feature_count: usize,
    pub publisher: String,
}

/// Distribution of one capacity field across all features
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CapacityStats {
    pub positive: usize,
    pub negative: usize,
    pub zero: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl CapacityStats {
    fn record(&mut self, value: f64) {
        if value > 0.0 {
            self.positive += 1;
        } else if value < 0.0 {
            self.negative += 1;
        } else {
            self.zero += 1;
        }
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.zero
    }
}

/// Summary over every collection in the grid directory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridSummary {
    /// Sources, largest first
    pub sources: Vec<SourceOverview>,
    pub total_features: usize,
    /// Statistics for available production capacity
    pub production: CapacityStats,
    pub failed: Vec<FailedSource>,
}

impl GridSummary {
    /// Summarizes already loaded collections
    pub fn from_collections<'a, I>(collections: I) -> Self
    where
        I: IntoIterator<Item = &'a Collection>,
    {
        let mut summary = GridSummary::default();
        for collection in collections {
            summary.total_features += collection.feature_count();
            for feature in &collection.features {
                summary
                    .production
                    .record(feature.capacity(properties::AVAILABLE_PRODUCTION));
            }
            summary.sources.push(SourceOverview {
                file: collection.file.clone(),
                feature_count: collection.feature_count(),
                publisher: collection
                    .publisher()
                    .unwrap_or_else(|| index::UNKNOWN_NAME.to_string()),
            });
        }
        // Stable sort keeps name order among equal counts
        summary
            .sources
            .sort_by(|a, b| b.feature_count.cmp(&a.feature_count));
        summary
    }
}

/// Loads the grid directory and summarizes it
pub async fn summarize_dir(grid_dir: &Path) -> SourceResult<GridSummary> {
    let sources =
        store::discover_sources(grid_dir, files::JSON_EXTENSION, &[paths::INDEX_FILE]).await?;

    let mut collections = Vec::with_capacity(sources.len());
    let mut failed = Vec::new();
    for path in &sources {
        match store::load_collection(path).await {
            Ok(collection) => collections.push(collection),
            Err(e) => {
                error!("Could not read {}: {}", path.display(), e);
                failed.push(FailedSource::new(path, &e));
            }
        }
    }

    let mut summary = GridSummary::from_collections(&collections);
    summary.failed = failed;
    info!(
        "Summarized {} sources with {} features",
        summary.sources.len(),
        summary.total_features
    );
    Ok(summary)
}
