//! Pipeline orchestration
//!
//! The grid pipeline enriches every collection in the grid directory, one
//! source at a time, and then rebuilds the index from what is on disk. The
//! tabular pipeline reads all extracts and writes one aggregate document.
//! Both keep going when a single source fails and report the failures in
//! their run statistics.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::enrich::{EnrichmentReport, FeatureEnricher};
use crate::app::index::{self, IndexBuilder};
use crate::app::lookup::RegionLookup;
use crate::app::store::{self, FailedSource};
use crate::app::tabular::{self, TabularAggregator};
use crate::constants::{files, paths};
use crate::errors::{AppError, Result};

/// Receives progress events from the grid pipeline
///
/// All methods default to doing nothing.
pub trait ProgressObserver {
    fn source_started(&mut self, _source_id: &str, _feature_count: usize) {}
    fn feature_done(&mut self, _processed: usize) {}
    fn source_finished(&mut self, _source_id: &str, _report: &EnrichmentReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Locations the grid pipeline reads from and writes to
#[derive(Debug, Clone, PartialEq)]
pub struct GridPaths {
    pub grid_dir: PathBuf,
    pub index_output: PathBuf,
    /// Directory receiving a copy of the index, when it exists
    pub dashboard_dir: Option<PathBuf>,
}

impl GridPaths {
    /// Conventional layout under a data root
    pub fn under(data_root: &Path) -> Self {
        Self {
            grid_dir: data_root.join(paths::GRID_DIR),
            index_output: data_root.join(paths::INDEX_FILE),
            dashboard_dir: None,
        }
    }
}

/// Statistics of one enrichment run
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub sources_total: usize,
    /// Sources enriched and written back
    pub sources_written: usize,
    /// Malformed sources left untouched on disk
    pub sources_skipped: usize,
    pub failed: Vec<FailedSource>,
    /// Feature counts summed over all sources
    pub features: EnrichmentReport,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl RunStats {
    fn new(sources_total: usize) -> Self {
        Self {
            sources_total,
            sources_written: 0,
            sources_skipped: 0,
            failed: Vec::new(),
            features: EnrichmentReport::default(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Share of features carrying region data, in percent
    pub fn coverage_percentage(&self) -> f64 {
        if self.features.total_features == 0 {
            return 0.0;
        }
        self.features.enriched_features as f64 / self.features.total_features as f64 * 100.0
    }

    /// Converts failed sources into an error for the exit status
    pub fn into_result(self) -> Result<Self> {
        if self.has_failures() {
            Err(AppError::SourcesFailed {
                failed: self.failed.len(),
                total: self.sources_total,
            })
        } else {
            Ok(self)
        }
    }
}

/// Where the index was written
#[derive(Debug, Clone, Serialize)]
pub struct IndexOutcome {
    pub index_path: PathBuf,
    pub dashboard_copy: Option<PathBuf>,
    pub total_files: usize,
    pub total_features: usize,
    pub failed: Vec<FailedSource>,
}

/// Enrichment followed by an index rebuild
pub struct GridPipeline<L> {
    enricher: FeatureEnricher<L>,
    index_builder: IndexBuilder,
    paths: GridPaths,
}

impl<L: RegionLookup> GridPipeline<L> {
    pub fn new(enricher: FeatureEnricher<L>, index_builder: IndexBuilder, paths: GridPaths) -> Self {
        Self {
            enricher,
            index_builder,
            paths,
        }
    }

    pub fn paths(&self) -> &GridPaths {
        &self.paths
    }

    /// Enriches every source in the grid directory
    ///
    /// # Errors
    ///
    /// Only fails when the grid directory cannot be listed. Per-source
    /// failures are collected in [`RunStats::failed`].
    pub async fn enrich_all<O: ProgressObserver>(&self, observer: &mut O) -> Result<RunStats> {
        let start = Instant::now();
        let sources = store::discover_sources(
            &self.paths.grid_dir,
            files::JSON_EXTENSION,
            &[paths::INDEX_FILE],
        )
        .await?;
        info!(
            "Enriching {} sources in {}",
            sources.len(),
            self.paths.grid_dir.display()
        );

        let mut stats = RunStats::new(sources.len());
        for path in &sources {
            match self.enrich_source(path, observer).await {
                Ok((report, written)) => {
                    stats.features.absorb(&report);
                    if written {
                        stats.sources_written += 1;
                    } else {
                        stats.sources_skipped += 1;
                    }
                }
                Err(e) => {
                    error!("Failed to process {}: {}", path.display(), e);
                    stats.failed.push(FailedSource::new(path, &e));
                }
            }
        }

        stats.duration = start.elapsed();
        info!(
            "Enrichment finished: {}/{} features with region data, {} failed sources",
            stats.features.enriched_features,
            stats.features.total_features,
            stats.failed.len()
        );
        Ok(stats)
    }

    async fn enrich_source<O: ProgressObserver>(
        &self,
        path: &Path,
        observer: &mut O,
    ) -> Result<(EnrichmentReport, bool)> {
        let mut collection = store::load_collection(path).await?;
        observer.source_started(&collection.source_id, collection.feature_count());

        let report = self
            .enricher
            .enrich_with_progress(&mut collection, |done| observer.feature_done(done))
            .await;
        observer.source_finished(&collection.source_id, &report);

        info!(
            "{}: {}/{} features enriched ({} new)",
            collection.source_id,
            report.enriched_features,
            report.total_features,
            report.newly_enriched
        );

        let written = store::save_collection(path, &collection).await?;
        Ok((report, written))
    }

    /// Rebuilds the index from the collections on disk and writes it
    pub async fn rebuild_index(&self) -> Result<IndexOutcome> {
        rebuild_index(&self.paths, &self.index_builder).await
    }

    /// Enriches all sources, then rebuilds the index
    ///
    /// The index is rebuilt even when some sources failed, so it always
    /// reflects the files on disk.
    pub async fn run<O: ProgressObserver>(&self, observer: &mut O) -> Result<(RunStats, IndexOutcome)> {
        let stats = self.enrich_all(observer).await?;
        let outcome = self.rebuild_index().await?;
        Ok((stats, outcome))
    }
}

/// Builds the index over `layout.grid_dir` and writes it with its dashboard copy
pub async fn rebuild_index(layout: &GridPaths, builder: &IndexBuilder) -> Result<IndexOutcome> {
    let run = index::build_from_dir(&layout.grid_dir, builder).await?;
    let dashboard_copy = store::write_with_copy(
        &run.index,
        &layout.index_output,
        layout.dashboard_dir.as_deref(),
        paths::INDEX_FILE,
    )
    .await?;

    info!("Index written to {}", layout.index_output.display());
    Ok(IndexOutcome {
        index_path: layout.index_output.clone(),
        dashboard_copy,
        total_files: run.index.metadata.total_files,
        total_features: run.index.metadata.total_features,
        failed: run.failed,
    })
}

/// Locations the tabular pipeline reads from and writes to
#[derive(Debug, Clone, PartialEq)]
pub struct TabularPaths {
    pub extract_dir: PathBuf,
    pub output: PathBuf,
    pub dashboard_dir: Option<PathBuf>,
}

impl TabularPaths {
    pub fn under(data_root: &Path) -> Self {
        let extract_dir = data_root.join(paths::MARU_DIR);
        Self {
            output: extract_dir.join(paths::MARU_OUTPUT_FILE),
            extract_dir,
            dashboard_dir: None,
        }
    }
}

/// Result of an aggregation run
#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutcome {
    pub output: PathBuf,
    pub dashboard_copy: Option<PathBuf>,
    pub extracts_total: usize,
    pub total_raw_records: usize,
    pub aggregated_records: usize,
    pub failed: Vec<FailedSource>,
}

impl AggregateOutcome {
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(AppError::SourcesFailed {
                failed: self.failed.len(),
                total: self.extracts_total,
            })
        }
    }
}

/// Reads every extract, aggregates them and writes the result
///
/// An extract that cannot be read is reported and left out; the remaining
/// extracts are still aggregated and written.
pub async fn aggregate_extracts(
    layout: &TabularPaths,
    aggregator: &TabularAggregator,
) -> Result<AggregateOutcome> {
    let extracts = tabular::discover_extracts(&layout.extract_dir).await?;
    let sheet = aggregator.config().sheet_name.as_str();

    let mut records = Vec::new();
    let mut source_files = Vec::new();
    let mut failed = Vec::new();
    for path in &extracts {
        info!("Loading {}", store::file_name(path));
        match tabular::load_extract(path, sheet).await {
            Ok(mut loaded) => {
                records.append(&mut loaded);
                source_files.push(store::file_name(path));
            }
            Err(e) => {
                error!("Skipping {}: {}", path.display(), e);
                failed.push(FailedSource::new(path, &e));
            }
        }
    }
    if source_files.is_empty() {
        warn!("No extract could be read, writing an empty aggregate");
    }
    info!("Total records: {}", records.len());

    let aggregate = aggregator.aggregate(&records, source_files);
    let dashboard_copy = store::write_with_copy(
        &aggregate,
        &layout.output,
        layout.dashboard_dir.as_deref(),
        paths::MARU_DASHBOARD_FILE,
    )
    .await?;

    Ok(AggregateOutcome {
        output: layout.output.clone(),
        dashboard_copy,
        extracts_total: extracts.len(),
        total_raw_records: aggregate.metadata.total_raw_records,
        aggregated_records: aggregate.metadata.aggregated_records,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::lookup::LookupOutcome;
    use crate::app::models::{Coordinate, RegionRecord};
    use serde_json::json;
    use tempfile::TempDir;

    struct Everywhere;

    impl RegionLookup for Everywhere {
        async fn lookup(&self, _point: Coordinate) -> LookupOutcome {
            LookupOutcome::Found(RegionRecord {
                municipality_code: "1804".to_string(),
                municipality_name: "Bodø".to_string(),
                county_code: "18".to_string(),
                county_name: "Nordland".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<(String, usize)>,
        finished: usize,
    }

    impl ProgressObserver for Recorder {
        fn source_started(&mut self, source_id: &str, feature_count: usize) {
            self.started.push((source_id.to_string(), feature_count));
        }

        fn source_finished(&mut self, _source_id: &str, _report: &EnrichmentReport) {
            self.finished += 1;
        }
    }

    fn pipeline(root: &Path) -> GridPipeline<Everywhere> {
        GridPipeline::new(
            FeatureEnricher::new(Everywhere, Duration::ZERO),
            IndexBuilder::default(),
            GridPaths::under(root),
        )
    }

    #[tokio::test]
    async fn test_failed_source_does_not_stop_run() {
        let temp_dir = TempDir::new().unwrap();
        let grid = temp_dir.path().join("grid");
        std::fs::create_dir(&grid).unwrap();
        std::fs::write(grid.join("a_broken.json"), "{").unwrap();
        std::fs::write(
            grid.join("b_good.json"),
            json!({"features": [{"geometry": {"type": "Point", "coordinates": [14.4, 67.3]}}]})
                .to_string(),
        )
        .unwrap();

        let mut recorder = Recorder::default();
        let (stats, outcome) = pipeline(temp_dir.path()).run(&mut recorder).await.unwrap();

        assert_eq!(stats.sources_total, 2);
        assert_eq!(stats.sources_written, 1);
        assert_eq!(stats.failed.len(), 1);
        assert_eq!(stats.failed[0].file, "a_broken.json");
        assert_eq!(stats.features.counts(), (1, 1));
        assert_eq!(stats.coverage_percentage(), 100.0);
        assert_eq!(recorder.started, vec![("b_good".to_string(), 1)]);
        assert_eq!(recorder.finished, 1);

        assert_eq!(outcome.total_files, 1);
        assert_eq!(outcome.failed.len(), 1);
        assert!(temp_dir.path().join("grid_index.json").exists());

        assert!(matches!(
            stats.into_result(),
            Err(AppError::SourcesFailed { failed: 1, total: 2 })
        ));
    }

    #[tokio::test]
    async fn test_missing_grid_dir_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = pipeline(temp_dir.path()).enrich_all(&mut NoProgress).await;
        assert!(matches!(result, Err(AppError::Source(_))));
    }

    #[tokio::test]
    async fn test_aggregate_reports_unreadable_extracts() {
        let temp_dir = TempDir::new().unwrap();
        let maru = temp_dir.path().join("maru");
        std::fs::create_dir(&maru).unwrap();
        std::fs::write(maru.join("maru_2024.xlsx"), "not a workbook").unwrap();

        let paths = TabularPaths::under(temp_dir.path());
        let outcome = aggregate_extracts(&paths, &TabularAggregator::default())
            .await
            .unwrap();
        assert_eq!(outcome.extracts_total, 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.total_raw_records, 0);

        let written = store::read_document(&paths.output).await.unwrap();
        assert_eq!(written["metadata"]["total_raw_records"], 0);
        assert!(outcome.into_result().is_err());
    }
}
