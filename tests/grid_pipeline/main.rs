//! Integration tests for the grid pipeline
//!
//! These tests run enrichment, index rebuild, validation and the summary
//! against collection files in a temporary data root, with an in-process
//! region lookup in place of the municipality service.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use elskip_data::app::validate::validate_dir;
use elskip_data::app::{
    summary, Coordinate, FeatureEnricher, GridPaths, GridPipeline, IndexBuilder, LookupOutcome,
    NoProgress, RegionLookup, RegionRecord,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Resolves points by latitude band; south of 58° is outside every municipality
#[derive(Clone, Default)]
struct BandLookup {
    calls: Arc<AtomicUsize>,
}

impl BandLookup {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RegionLookup for BandLookup {
    async fn lookup(&self, point: Coordinate) -> LookupOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (code, name, county_code, county) = if point.lat >= 65.0 {
            ("1804", "Bodø", "18", "Nordland")
        } else if point.lat >= 60.0 {
            ("4601", "Bergen", "46", "Vestland")
        } else if point.lat >= 58.0 {
            ("0301", "Oslo", "03", "Oslo")
        } else {
            return LookupOutcome::NotFound;
        };
        LookupOutcome::Found(RegionRecord {
            municipality_code: code.to_string(),
            municipality_name: name.to_string(),
            county_code: county_code.to_string(),
            county_name: county.to_string(),
        })
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Data root with two operators, one malformed file and a dashboard directory
fn setup_data_root() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let grid = temp_dir.path().join("data").join("grid");
    std::fs::create_dir_all(&grid).unwrap();
    std::fs::create_dir_all(temp_dir.path().join("dashboard").join("public")).unwrap();

    write_json(
        &grid.join("bkk.json"),
        &json!([{
            "type": "FeatureCollection",
            "dcterms:publisher": [{"dcterms:title": "BKK Nett AS"}],
            "prov:generatedAt": [{"@value": "2025-02-01T00:00:00Z"}],
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [5.32, 60.39]},
                 "properties": {"name": "Kokstad", "owner": "BKK", "availableCons": 12.0}},
                {"type": "Feature",
                 "geometry": {"type": "Polygon",
                              "coordinates": [[[14.0, 67.0], [15.0, 67.0], [15.0, 68.0], [14.0, 68.0]]]},
                 "properties": {"name": "Bodø havn", "owner": "BKK", "availableProd": -3.5}}
            ]
        }]),
    );
    write_json(
        &grid.join("elvia.json"),
        &json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [10.75, 59.91]},
                 "properties": {"name": "Filipstad", "owner": "Elvia"}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [3.0, 56.0]},
                 "properties": {"name": "Offshore", "owner": "Elvia"}},
                {"type": "Feature", "geometry": null, "properties": {"name": "Ukjent"}}
            ]
        }),
    );
    std::fs::write(grid.join("odd.json"), "[1, 2, 3]").unwrap();
    temp_dir
}

fn pipeline(root: &Path, lookup: BandLookup) -> GridPipeline<BandLookup> {
    let mut paths = GridPaths::under(&root.join("data"));
    paths.dashboard_dir = Some(root.join("dashboard").join("public"));
    GridPipeline::new(
        FeatureEnricher::new(lookup, Duration::ZERO),
        IndexBuilder::default(),
        paths,
    )
}

#[tokio::test]
async fn test_enrich_and_index() {
    let temp_dir = setup_data_root();
    let root = temp_dir.path();
    let lookup = BandLookup::default();

    let (stats, outcome) = pipeline(root, lookup.clone()).run(&mut NoProgress).await.unwrap();

    assert_eq!(stats.sources_total, 3);
    assert_eq!(stats.sources_written, 2);
    assert_eq!(stats.sources_skipped, 1);
    assert!(stats.failed.is_empty());
    assert_eq!(stats.features.counts(), (5, 3));
    assert_eq!(stats.features.without_coordinate, 1);
    assert_eq!(stats.features.lookup_misses, 1);
    assert_eq!(lookup.calls(), 4);

    // Shapes are preserved on write-back
    let bkk = read_json(&root.join("data/grid/bkk.json"));
    assert!(bkk.is_array());
    let bodo = &bkk[0]["features"][1]["properties"];
    assert_eq!(bodo["kommune"], "Bodø");
    assert_eq!(bodo["fylke_nr"], "18");
    let elvia = read_json(&root.join("data/grid/elvia.json"));
    assert!(elvia.is_object());
    assert_eq!(elvia["features"][0]["properties"]["kommune"], "Oslo");
    assert_eq!(
        std::fs::read_to_string(root.join("data/grid/odd.json")).unwrap(),
        "[1, 2, 3]"
    );

    // Index and its dashboard copy
    assert_eq!(outcome.total_files, 3);
    assert_eq!(outcome.total_features, 5);
    let index = read_json(&root.join("data/grid_index.json"));
    assert_eq!(index, read_json(&root.join("dashboard/public/grid_index.json")));
    assert_eq!(index["sources"]["bkk"]["publisher"], "BKK Nett AS");
    assert_eq!(index["sources"]["bkk"]["generated_at"], "2025-02-01T00:00:00Z");
    assert_eq!(index["sources"]["elvia"]["publisher"], "ELVIA");
    assert_eq!(index["sources"]["bkk"]["locations"][1]["available_production"], -3.5);
    assert_eq!(index["sources"]["bkk"]["locations"][0]["kommune"], "Bergen");
    let summed: u64 = index["sources"]
        .as_object()
        .unwrap()
        .values()
        .map(|s| s["feature_count"].as_u64().unwrap())
        .sum();
    assert_eq!(index["metadata"]["total_features"].as_u64(), Some(summed));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let temp_dir = setup_data_root();
    let root = temp_dir.path();
    let lookup = BandLookup::default();

    pipeline(root, lookup.clone()).run(&mut NoProgress).await.unwrap();
    let bkk_first = std::fs::read_to_string(root.join("data/grid/bkk.json")).unwrap();
    let elvia_first = std::fs::read_to_string(root.join("data/grid/elvia.json")).unwrap();
    let calls_first = lookup.calls();

    let (stats, _) = pipeline(root, lookup.clone()).run(&mut NoProgress).await.unwrap();
    assert_eq!(stats.features.newly_enriched, 0);
    assert_eq!(stats.features.already_enriched, 3);
    // Only the offshore point is looked up again
    assert_eq!(lookup.calls(), calls_first + 1);

    assert_eq!(
        std::fs::read_to_string(root.join("data/grid/bkk.json")).unwrap(),
        bkk_first
    );
    assert_eq!(
        std::fs::read_to_string(root.join("data/grid/elvia.json")).unwrap(),
        elvia_first
    );
}

#[tokio::test]
async fn test_removed_source_leaves_index() {
    let temp_dir = setup_data_root();
    let root = temp_dir.path();
    let pipeline = pipeline(root, BandLookup::default());

    pipeline.rebuild_index().await.unwrap();
    std::fs::remove_file(root.join("data/grid/elvia.json")).unwrap();
    let outcome = pipeline.rebuild_index().await.unwrap();

    assert_eq!(outcome.total_files, 2);
    let index = read_json(&root.join("data/grid_index.json"));
    assert!(index["sources"].get("elvia").is_none());
    assert_eq!(index["metadata"]["total_features"], 2);
}

#[tokio::test]
async fn test_validation_and_summary() {
    let temp_dir = setup_data_root();
    let grid = temp_dir.path().join("data/grid");
    write_json(
        &grid.join("zz_bad.json"),
        &json!({
            "type": "FeatureCollection",
            "dcterms:publisher": [{"dcterms:title": "Test"}],
            "features": [{"type": "Feature",
                          "geometry": {"type": "Point", "coordinates": [200, 60]},
                          "properties": {"name": "Far east", "owner": "Test"}}]
        }),
    );
    std::fs::write(grid.join("zz_broken.json"), "{\"features\": [").unwrap();

    let report = validate_dir(&grid).await.unwrap();
    assert_eq!(report.summary.total_files, 5);
    assert!(!report.summary.passed);
    assert_eq!(report.per_file["zz_bad.json"].error_count, 1);
    assert!(report.per_file["zz_broken.json"].errors[0].starts_with("Invalid JSON"));
    // Null geometry is an error, missing publisher and owner are warnings
    assert_eq!(report.per_file["elvia.json"].error_count, 1);
    assert_eq!(report.per_file["elvia.json"].warning_count, 2);
    assert_eq!(report.per_file["bkk.json"].error_count, 0);

    let overview = summary::summarize_dir(&grid).await.unwrap();
    assert_eq!(overview.failed.len(), 1);
    assert_eq!(overview.sources[0].file, "elvia.json");
    assert_eq!(overview.production.negative, 1);
}
