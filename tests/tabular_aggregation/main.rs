//! Integration tests for MarU extract aggregation
//!
//! Worksheet rows are fed through the reader's row conversion and the
//! aggregator, then checked against the dashboard document layout.

use std::path::Path;

use calamine::Data;
use chrono::{TimeZone, Utc};
use elskip_data::app::pipeline::{aggregate_extracts, TabularPaths};
use elskip_data::app::tabular::{records_from_rows, Category, TabularConfig, MEASURES};
use elskip_data::app::TabularAggregator;
use elskip_data::errors::AppError;
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use tempfile::TempDir;

fn s(value: &str) -> Data {
    Data::String(value.to_string())
}

fn header() -> Vec<Data> {
    [
        "year",
        "vessel_type",
        "gt_group",
        "phase",
        "voyage_type",
        "county_name",
        "sum_kwh",
        "sum_co2_tonnes",
        "distance_kilometers",
    ]
    .iter()
    .map(|h| s(h))
    .collect()
}

fn row(year: f64, vessel: &str, county: Data, kwh: f64, co2: f64, km: f64) -> Vec<Data> {
    vec![
        Data::Float(year),
        s(vessel),
        s("5000-9999"),
        s("Seilas"),
        s("Innenriks"),
        county,
        Data::Float(kwh),
        Data::Float(co2),
        Data::Float(km),
    ]
}

fn worksheet() -> Vec<Vec<Data>> {
    vec![
        header(),
        row(2023.0, "Passasjer", s("Vestland"), 100.0, 1.5, 10.0),
        row(2023.0, "Passasjer", s("Vestland"), 50.0, 0.5, 5.0),
        row(2024.0, "Passasjer", s("Vestland"), 70.0, 0.7, 7.0),
        row(2024.0, "Tank", Data::Empty, 30.0, 0.3, 3.0),
        row(2024.0, "Tank", s("  "), 20.0, 0.2, 2.0),
        vec![Data::Empty; 9],
        row(2024.0, "Fiske", s("Nordland"), 10.0, 0.1, 1.0),
    ]
}

fn records() -> Vec<elskip_data::app::TabularRecord> {
    let sheet = worksheet();
    records_from_rows(
        Path::new("2023_2024.xlsx"),
        sheet.iter().map(Vec::as_slice),
    )
    .unwrap()
}

fn aggregator() -> TabularAggregator {
    TabularAggregator::new(TabularConfig {
        unknown_region: "Ukjent".to_string(),
        ..Default::default()
    })
}

#[test]
fn test_measures_survive_aggregation() {
    let records = records();
    assert_eq!(records.len(), 6);

    let aggregate = aggregator().aggregate(&records, vec!["2023_2024.xlsx".to_string()]);
    let raw_kwh: f64 = records.iter().map(|r| r.measures.get("sum_kwh").unwrap()).sum();
    let row_kwh: f64 = aggregate
        .data
        .iter()
        .map(|r| r.measures.get("sum_kwh").unwrap())
        .sum();
    let period_kwh: f64 = aggregate
        .period_totals
        .iter()
        .map(|t| t.measures.get("sum_kwh").unwrap())
        .sum();
    assert_eq!(raw_kwh, 280.0);
    assert_eq!(row_kwh, raw_kwh);
    assert_eq!(period_kwh, raw_kwh);

    let folded: usize = aggregate.data.iter().map(|r| r.record_count).sum();
    assert_eq!(folded, records.len());
    assert_eq!(aggregate.metadata.total_raw_records, 6);
    assert_eq!(aggregate.metadata.aggregated_records, aggregate.data.len());
}

#[test]
fn test_missing_region_is_grouped_under_label() {
    let aggregate = aggregator().aggregate(&records(), Vec::new());

    // 2023 Passasjer folds two records, both tank records share the label
    assert_eq!(aggregate.data.len(), 4);
    let tank: Vec<_> = aggregate
        .data
        .iter()
        .filter(|r| r.dimensions[1] == Some(Category::text("Tank")))
        .collect();
    assert_eq!(tank.len(), 1);
    assert_eq!(tank[0].dimensions[5], Some(Category::text("Ukjent")));
    assert_eq!(tank[0].measures.get("sum_kwh"), Some(50.0));

    // Facets list only values present in the data
    assert_eq!(
        aggregate.facets.counties,
        vec![Category::text("Nordland"), Category::text("Vestland")]
    );
    assert_eq!(
        aggregate.facets.years,
        vec![Category::Int(2023), Category::Int(2024)]
    );
}

#[test]
fn test_dashboard_document_layout() {
    let at = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
    let aggregate = aggregator().aggregate_at(&records(), vec!["2023_2024.xlsx".to_string()], at);
    let value = serde_json::to_value(&aggregate).unwrap();

    assert_eq!(value["metadata"]["source_files"][0], "2023_2024.xlsx");
    assert_eq!(value["metadata"]["generated_at"], "2025-01-15T09:30:00Z");
    assert_eq!(value["filters"]["vessel_types"][0], "Fiske");

    let first = &value["data"][0];
    assert_eq!(first["year"], 2023);
    assert_eq!(first["sum_kwh"], 150.0);
    assert_eq!(first["sum_co2_tonnes"], 2.0);
    // Columns absent from the worksheet are zero
    assert_eq!(first["sum_nox_tonnes"], 0.0);
    assert_eq!(first.as_object().unwrap().len(), 6 + MEASURES.len());

    let totals = value["year_totals"].as_array().unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[1]["year"], 2024);
    assert_eq!(totals[1]["distance_kilometers"], 13.0);
}

/// Writes an extract with one worksheet named `sheet`
fn write_extract(path: &Path, sheet: &str, rows: &[(f64, &str, &str, f64)]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    let header = [
        "year",
        "vessel_type",
        "gt_group",
        "phase",
        "voyage_type",
        "county_name",
        "sum_kwh",
        "sum_co2_tonnes",
    ];
    for (c, name) in header.iter().enumerate() {
        worksheet.write_string(0, c as u16, *name).unwrap();
    }
    for (i, (year, vessel, county, kwh)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        worksheet.write_number(r, 0, *year).unwrap();
        worksheet.write_string(r, 1, *vessel).unwrap();
        worksheet.write_string(r, 2, "1000-4999").unwrap();
        worksheet.write_string(r, 3, "Seilas").unwrap();
        worksheet.write_string(r, 4, "Innenriks").unwrap();
        if !county.is_empty() {
            worksheet.write_string(r, 5, *county).unwrap();
        }
        worksheet.write_number(r, 6, *kwh).unwrap();
        worksheet.write_number(r, 7, *kwh / 100.0).unwrap();
    }
    workbook.save(path).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_aggregate_extracts_from_workbooks() {
    let temp_dir = TempDir::new().unwrap();
    let maru = temp_dir.path().join("maru");
    let dashboard = temp_dir.path().join("public");
    std::fs::create_dir_all(&maru).unwrap();
    std::fs::create_dir_all(&dashboard).unwrap();

    write_extract(
        &maru.join("maru_2023.xlsx"),
        "Sheet1",
        &[
            (2023.0, "Passasjer", "Vestland", 400.0),
            (2023.0, "Passasjer", "Vestland", 100.0),
            (2023.0, "Tank", "", 50.0),
        ],
    );
    // No Sheet1 here, the first sheet is read instead
    write_extract(
        &maru.join("maru_2024.xlsx"),
        "Eksport",
        &[(2024.0, "Fiske", "Nordland", 25.0)],
    );

    let mut layout = TabularPaths::under(temp_dir.path());
    layout.dashboard_dir = Some(dashboard.clone());
    let outcome = aggregate_extracts(&layout, &aggregator()).await.unwrap();

    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.extracts_total, 2);
    assert_eq!(outcome.total_raw_records, 4);
    assert_eq!(outcome.aggregated_records, 3);
    assert_eq!(outcome.dashboard_copy, Some(dashboard.join("maru_data.json")));

    let written = read_json(&maru.join("maru_dashboard_data.json"));
    assert_eq!(written, read_json(&dashboard.join("maru_data.json")));
    assert_eq!(
        written["metadata"]["source_files"],
        serde_json::json!(["maru_2023.xlsx", "maru_2024.xlsx"])
    );
    assert_eq!(written["filters"]["years"], serde_json::json!([2023, 2024]));

    let kwh: f64 = written["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["sum_kwh"].as_f64().unwrap())
        .sum();
    assert_eq!(kwh, 575.0);
    let tank = written["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["vessel_type"] == "Tank")
        .unwrap();
    assert_eq!(tank["county_name"], "Ukjent");
    assert_eq!(written["year_totals"][1]["sum_kwh"], 25.0);
}

#[tokio::test]
async fn test_missing_extracts_fail_the_run() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("maru")).unwrap();
    std::fs::write(temp_dir.path().join("maru").join("notes.txt"), "not an extract").unwrap();

    let layout = TabularPaths::under(temp_dir.path());
    let result = aggregate_extracts(&layout, &aggregator()).await;
    assert!(matches!(result, Err(AppError::Tabular(_))));
    assert!(!layout.output.exists());
}
