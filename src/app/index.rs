//! Cross-source grid index
//!
//! The index is rebuilt from scratch on every run from whatever collections
//! are on disk. It is never merged with a previous index, so removed sources
//! disappear and totals always match the files.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::app::models::{Collection, Feature};
use crate::app::store::{self, FailedSource};
use crate::constants::{files, index, paths, properties};
use crate::errors::SourceResult;

/// Settings for index generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Description written into the index metadata
    pub description: String,
    /// Maximum locations listed per source (`None` lists all)
    pub location_sample_limit: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            description: index::DESCRIPTION.to_string(),
            location_sample_limit: None,
        }
    }
}

/// Index-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub generated_at: DateTime<Utc>,
    pub description: String,
    pub total_files: usize,
    pub total_features: usize,
}

/// One feature as listed in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Raw geometry coordinates, as published
    pub coordinates: Value,
    pub available_consumption: f64,
    pub available_production: f64,
    pub reserved_consumption: f64,
    #[serde(rename = "kommune")]
    pub municipality: Option<String>,
    #[serde(rename = "kommune_nr")]
    pub municipality_code: Option<String>,
    #[serde(rename = "fylke")]
    pub county: Option<String>,
    #[serde(rename = "fylke_nr")]
    pub county_code: Option<String>,
}

impl Location {
    pub fn from_feature(feature: &Feature) -> Self {
        let coordinates = match feature.raw_coordinates() {
            Value::Null => Value::Array(Vec::new()),
            other => other.clone(),
        };
        Self {
            name: feature.name(),
            coordinates,
            available_consumption: feature.capacity(properties::AVAILABLE_CONSUMPTION),
            available_production: feature.capacity(properties::AVAILABLE_PRODUCTION),
            reserved_consumption: feature.capacity(properties::RESERVED_CONSUMPTION),
            municipality: feature.region_field(properties::MUNICIPALITY),
            municipality_code: feature.region_field(properties::MUNICIPALITY_CODE),
            county: feature.region_field(properties::COUNTY),
            county_code: feature.region_field(properties::COUNTY_CODE),
        }
    }
}

/// Per-source summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub file: String,
    pub feature_count: usize,
    pub publisher: String,
    pub generated_at: Option<String>,
    pub locations: Vec<Location>,
}

/// Index over all grid collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridIndex {
    pub metadata: IndexMetadata,
    pub sources: BTreeMap<String, SourceSummary>,
}

impl GridIndex {
    /// Sum of per-source feature counts
    pub fn summed_feature_count(&self) -> usize {
        self.sources.values().map(|s| s.feature_count).sum()
    }
}

/// Builds a [`GridIndex`] from collections
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    config: IndexConfig,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Builds the index at the current time
    pub fn build<'a, I>(&self, collections: I) -> GridIndex
    where
        I: IntoIterator<Item = &'a Collection>,
    {
        self.build_at(collections, Utc::now())
    }

    /// Builds the index with an explicit timestamp
    ///
    /// Source ids are unique in the index; a later collection with an id
    /// already present is left out.
    pub fn build_at<'a, I>(&self, collections: I, generated_at: DateTime<Utc>) -> GridIndex
    where
        I: IntoIterator<Item = &'a Collection>,
    {
        let mut sources = BTreeMap::new();

        for collection in collections {
            match sources.entry(collection.source_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(self.summarize(collection));
                }
                Entry::Occupied(_) => warn!(
                    "Duplicate source id '{}' from {}, left out of the index",
                    collection.source_id, collection.file
                ),
            }
        }
        let total_features: usize = sources.values().map(|s| s.feature_count).sum();

        GridIndex {
            metadata: IndexMetadata {
                generated_at,
                description: self.config.description.clone(),
                total_files: sources.len(),
                total_features,
            },
            sources,
        }
    }

    fn summarize(&self, collection: &Collection) -> SourceSummary {
        let limit = self.config.location_sample_limit.unwrap_or(usize::MAX);
        SourceSummary {
            file: collection.file.clone(),
            feature_count: collection.feature_count(),
            publisher: collection.publisher_name(),
            generated_at: collection.generated_at(),
            locations: collection
                .features
                .iter()
                .take(limit)
                .map(Location::from_feature)
                .collect(),
        }
    }
}

/// Outcome of an index rebuild over a directory
#[derive(Debug)]
pub struct IndexRun {
    pub index: GridIndex,
    /// Sources that could not be read
    pub failed: Vec<FailedSource>,
}

/// Loads every collection in `grid_dir` and builds the index
///
/// Unreadable sources are reported in [`IndexRun::failed`] and left out of
/// the index.
pub async fn build_from_dir(grid_dir: &Path, builder: &IndexBuilder) -> SourceResult<IndexRun> {
    let sources =
        store::discover_sources(grid_dir, files::JSON_EXTENSION, &[paths::INDEX_FILE]).await?;

    let mut collections = Vec::with_capacity(sources.len());
    let mut seen = HashSet::new();
    let mut failed = Vec::new();
    for path in &sources {
        match store::load_collection(path).await {
            Ok(collection) if !seen.insert(collection.source_id.clone()) => {
                error!("Skipping {} in index: duplicate source id", path.display());
                failed.push(FailedSource::new(
                    path,
                    format!("duplicate source id '{}'", collection.source_id),
                ));
            }
            Ok(collection) => collections.push(collection),
            Err(e) => {
                error!("Skipping {} in index: {}", path.display(), e);
                failed.push(FailedSource::new(path, &e));
            }
        }
    }

    let index = builder.build(&collections);
    info!(
        "Index built: {} files, {} features",
        index.metadata.total_files, index.metadata.total_features
    );
    Ok(IndexRun { index, failed })
}
