//! Command handlers for the elskip_data CLI
//!
//! Each handler wires configuration into one pipeline, runs it and prints a
//! summary on stdout. Failed sources turn into `AppError::SourcesFailed` after
//! the summary is printed, so the process exits non-zero while still
//! reporting everything that succeeded.

use std::path::Path;

use tracing::info;

use crate::app::enrich::FeatureEnricher;
use crate::app::index::IndexBuilder;
use crate::app::lookup::RegionLookupClient;
use crate::app::pipeline::{self, AggregateOutcome, GridPipeline, IndexOutcome, RunStats};
use crate::app::store::{self, FailedSource};
use crate::app::summary;
use crate::app::tabular::TabularAggregator;
use crate::app::validate::{self, ValidationReport};
use crate::cli::{EnrichArgs, ProgressConfig, ProgressDisplay, ValidateArgs};
use crate::config::AppConfig;
use crate::constants::report::FINDINGS_SHOWN_PER_FILE;
use crate::errors::{AppError, Result};

/// Handle the enrich command
///
/// Enriches every grid collection and, unless skipped, rebuilds the index.
pub async fn handle_enrich(config: &AppConfig, args: EnrichArgs, quiet: bool) -> Result<()> {
    let client = RegionLookupClient::new(&config.lookup)?;
    let enricher = FeatureEnricher::new(client, config.lookup.inter_call_delay);
    let pipeline = GridPipeline::new(
        enricher,
        IndexBuilder::new(config.index.clone()),
        config.paths.grid_paths(),
    );

    let mut display = ProgressDisplay::new(ProgressConfig {
        quiet,
        ..Default::default()
    });
    let stats = pipeline.enrich_all(&mut display).await?;
    drop(display);
    print_enrichment(&stats);

    if args.skip_index {
        info!("Index rebuild skipped");
    } else {
        let outcome = pipeline.rebuild_index().await?;
        print_index(&outcome);
    }

    stats.into_result().map(|_| ())
}

/// Handle the index command
pub async fn handle_index(config: &AppConfig) -> Result<()> {
    let builder = IndexBuilder::new(config.index.clone());
    let outcome = pipeline::rebuild_index(&config.paths.grid_paths(), &builder).await?;
    print_index(&outcome);

    if outcome.failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::SourcesFailed {
            failed: outcome.failed.len(),
            total: outcome.total_files + outcome.failed.len(),
        })
    }
}

/// Handle the aggregate command
pub async fn handle_aggregate(config: &AppConfig) -> Result<()> {
    let aggregator = TabularAggregator::new(config.tabular.clone());
    let outcome = pipeline::aggregate_extracts(&config.paths.tabular_paths(), &aggregator).await?;
    print_aggregate(&outcome);
    outcome.into_result().map(|_| ())
}

/// Handle the validate command
///
/// Findings never fail the command; only an unreadable grid directory or an
/// unwritable report file do.
pub async fn handle_validate(config: &AppConfig, args: ValidateArgs) -> Result<()> {
    let grid_dir = config.paths.grid_dir();
    let report = validate::validate_dir(&grid_dir).await?;

    if report.summary.total_files == 0 {
        println!("No JSON files found in {}", grid_dir.display());
        return Ok(());
    }
    print_validation(&report);

    if let Some(output) = args.output {
        store::write_json_atomic(&output, &report).await?;
        println!("\nReport written to {}", output.display());
    }
    Ok(())
}

/// Handle the summary command
pub async fn handle_summary(config: &AppConfig) -> Result<()> {
    let summary = summary::summarize_dir(&config.paths.grid_dir()).await?;

    println!("Grid operators:");
    for source in &summary.sources {
        println!(
            "  - {}: {} locations ({})",
            source.file, source.feature_count, source.publisher
        );
    }
    println!("\nTotal features: {}", summary.total_features);

    let production = &summary.production;
    println!("\nAvailable production capacity (availableProd):");
    println!("  Positive: {}", production.positive);
    println!("  Negative: {}", production.negative);
    println!("  Zero:     {}", production.zero);
    if let (Some(min), Some(max)) = (production.min, production.max) {
        println!("  Range:    {} .. {} MW", min, max);
    }
    print_failed(&summary.failed);

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::SourcesFailed {
            failed: summary.failed.len(),
            total: summary.sources.len() + summary.failed.len(),
        })
    }
}

fn print_enrichment(stats: &RunStats) {
    let features = &stats.features;
    println!("\nEnrichment summary:");
    println!("  Sources:            {}", stats.sources_total);
    println!("  Written:            {}", stats.sources_written);
    if stats.sources_skipped > 0 {
        println!("  Skipped (malformed): {}", stats.sources_skipped);
    }
    println!(
        "  Features enriched:  {}/{} ({:.1}%)",
        features.enriched_features,
        features.total_features,
        stats.coverage_percentage()
    );
    println!("  Newly enriched:     {}", features.newly_enriched);
    println!("  Without coordinate: {}", features.without_coordinate);
    println!("  Lookup misses:      {}", features.lookup_misses);
    println!("  Duration:           {:.1}s", stats.duration.as_secs_f64());
    print_failed(&stats.failed);
}

fn print_index(outcome: &IndexOutcome) {
    println!("\nIndex: {} files, {} features", outcome.total_files, outcome.total_features);
    println!("  Saved to {}", outcome.index_path.display());
    print_copy(outcome.dashboard_copy.as_deref());
    print_failed(&outcome.failed);
}

fn print_aggregate(outcome: &AggregateOutcome) {
    println!("\nAggregation summary:");
    println!("  Extracts:           {}", outcome.extracts_total);
    println!("  Raw records:        {}", outcome.total_raw_records);
    println!("  Aggregated records: {}", outcome.aggregated_records);
    println!("  Saved to {}", outcome.output.display());
    print_copy(outcome.dashboard_copy.as_deref());
    print_failed(&outcome.failed);
}

fn print_copy(copy: Option<&Path>) {
    if let Some(copy) = copy {
        println!("  Copied to {}", copy.display());
    }
}

fn print_failed(failed: &[FailedSource]) {
    if failed.is_empty() {
        return;
    }
    println!("\n❌ {} source(s) failed:", failed.len());
    for source in failed {
        println!("   - {}: {}", source.file, source.reason);
    }
}

fn print_validation(report: &ValidationReport) {
    let shown = FINDINGS_SHOWN_PER_FILE;
    for (file, findings) in &report.per_file {
        if findings.error_count == 0 && findings.warning_count == 0 {
            continue;
        }
        println!("📄 {}:", file);
        print_findings("❌", "error(s)", &findings.errors, shown);
        print_findings("⚠️ ", "warning(s)", &findings.warnings, shown);
    }

    let summary = &report.summary;
    println!("\n{}", "=".repeat(60));
    println!("Validation Summary:");
    println!("  Total files: {}", summary.total_files);
    println!("  Files with errors: {}", summary.files_with_errors);
    println!("  Files with warnings: {}", summary.files_with_warnings);
    println!("  Total errors: {}", summary.total_errors);
    println!("  Total warnings: {}", summary.total_warnings);

    if summary.total_errors == 0 && summary.total_warnings == 0 {
        println!("\n✅ All files validated successfully!");
    } else if summary.passed {
        println!("\n✅ All files are valid (some warnings present)");
    } else {
        println!("\n❌ Some files have errors that need to be fixed");
    }
}

fn print_findings(marker: &str, label: &str, findings: &[String], shown: usize) {
    if findings.is_empty() {
        return;
    }
    println!("   {} {} {}", marker, findings.len(), label);
    for finding in findings.iter().take(shown) {
        println!("      - {}", finding);
    }
    if findings.len() > shown {
        println!("      ... and {} more", findings.len() - shown);
    }
}
