//! Structural linting of grid collection files
//!
//! Findings are advisory: errors mark data that cannot be used as is,
//! warnings mark data that is usable but suspicious. Nothing here mutates
//! the input or stops a run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::app::store;
use crate::constants::{bounds, files, geojson, paths, properties};
use crate::errors::{SourceError, SourceResult};

/// Findings for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Findings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Per-file entry of a [`ValidationReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<Findings> for FileReport {
    fn from(findings: Findings) -> Self {
        Self {
            error_count: findings.errors.len(),
            warning_count: findings.warnings.len(),
            errors: findings.errors,
            warnings: findings.warnings,
        }
    }
}

/// Aggregate pass/fail summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_files: usize,
    pub files_with_errors: usize,
    pub files_with_warnings: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    /// True when no file has errors; warnings do not fail validation
    pub passed: bool,
}

/// Validation results for a set of files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub per_file: BTreeMap<String, FileReport>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Records the findings for one file and updates the summary
    pub fn add(&mut self, file: impl Into<String>, findings: Findings) {
        self.per_file.insert(file.into(), FileReport::from(findings));
        self.recompute();
    }

    fn recompute(&mut self) {
        let files = self.per_file.values();
        self.summary = ValidationSummary {
            total_files: self.per_file.len(),
            files_with_errors: files.clone().filter(|r| r.error_count > 0).count(),
            files_with_warnings: files.clone().filter(|r| r.warning_count > 0).count(),
            total_errors: files.clone().map(|r| r.error_count).sum(),
            total_warnings: files.map(|r| r.warning_count).sum(),
            passed: self.per_file.values().all(|r| r.error_count == 0),
        };
    }
}

/// Validates a parsed collection document
pub fn validate_document(document: &Value) -> Findings {
    let mut findings = Findings::default();

    let collection = match document {
        Value::Array(items) => match items.first() {
            Some(first) => first,
            None => {
                findings.error("File is empty list");
                return findings;
            }
        },
        other => other,
    };

    let Some(collection) = collection.as_object() else {
        findings.error("Collection is not an object");
        return findings;
    };

    match collection.get("type") {
        None => findings.error("Missing 'type' field"),
        Some(Value::String(t)) if t == geojson::FEATURE_COLLECTION => {}
        Some(other) => findings.warning(format!(
            "Type is '{}', expected '{}'",
            type_label(other),
            geojson::FEATURE_COLLECTION
        )),
    }

    match collection.get("features") {
        None => {}
        Some(Value::Array(features)) => {
            for (i, feature) in features.iter().enumerate() {
                validate_feature(i, feature, &mut findings);
            }
        }
        Some(_) => findings.error("'features' is not a list"),
    }

    if !collection.contains_key(geojson::PUBLISHER) {
        findings.warning("Missing publisher metadata");
    }

    findings
}

fn validate_feature(i: usize, feature: &Value, findings: &mut Findings) {
    let Some(feature) = feature.as_object() else {
        findings.error(format!("Feature {} is not an object", i));
        return;
    };

    match feature.get("type") {
        None => findings.error(format!("Feature {} missing 'type'", i)),
        Some(Value::String(t)) if t == geojson::FEATURE => {}
        Some(other) => findings.warning(format!(
            "Feature {} type is '{}', expected '{}'",
            i,
            type_label(other),
            geojson::FEATURE
        )),
    }

    match feature.get("geometry").and_then(Value::as_object) {
        Some(geometry) if !geometry.is_empty() => validate_geometry(i, geometry, findings),
        _ => findings.error(format!("Feature {} missing 'geometry'", i)),
    }

    match feature.get("properties").and_then(Value::as_object) {
        Some(props) if !props.is_empty() => {
            for key in properties::EXPECTED {
                if !props.contains_key(key) {
                    findings.warning(format!("Feature {} missing property '{}'", i, key));
                }
            }
        }
        _ => findings.warning(format!("Feature {} missing 'properties'", i)),
    }
}

fn validate_geometry(i: usize, geometry: &Map<String, Value>, findings: &mut Findings) {
    let coords = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    match geometry.get("type").and_then(Value::as_str) {
        Some("Point") => {
            let numbers: Option<Vec<f64>> = coords.iter().map(Value::as_f64).collect();
            match numbers.as_deref() {
                Some([lon, lat]) => {
                    if !in_range(*lon, bounds::LONGITUDE) {
                        findings.error(format!("Feature {} longitude {} out of range", i, lon));
                    }
                    if !in_range(*lat, bounds::LATITUDE) {
                        findings.error(format!("Feature {} latitude {} out of range", i, lat));
                    }
                }
                _ => findings.error(format!("Feature {} Point has invalid coordinates", i)),
            }
        }
        Some("Polygon") => {
            let first_vertex = coords
                .first()
                .and_then(Value::as_array)
                .and_then(|ring| ring.first())
                .and_then(Value::as_array)
                .filter(|vertex| vertex.len() >= 2);
            if let Some(vertex) = first_vertex {
                if let (Some(lon), Some(lat)) = (vertex[0].as_f64(), vertex[1].as_f64()) {
                    if !in_range(lon, bounds::LONGITUDE) {
                        findings.warning(format!(
                            "Feature {} Polygon longitude {} out of range",
                            i, lon
                        ));
                    }
                    if !in_range(lat, bounds::LATITUDE) {
                        findings.warning(format!(
                            "Feature {} Polygon latitude {} out of range",
                            i, lat
                        ));
                    }
                }
            }
        }
        Some("MultiPolygon") => {}
        other => findings.warning(format!(
            "Feature {} geometry type is '{}' (Point/Polygon expected)",
            i,
            other.unwrap_or("none")
        )),
    }
}

/// Declared type as shown in findings, without JSON quoting
fn type_label(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

fn in_range(value: f64, (min, max): (f64, f64)) -> bool {
    (min..=max).contains(&value)
}

/// Validates one file; read and parse failures become errors
pub async fn validate_file(path: &Path) -> Findings {
    match store::read_document(path).await {
        Ok(document) => validate_document(&document),
        Err(e) => {
            let mut findings = Findings::default();
            match e {
                SourceError::Parse { source, .. } => {
                    findings.error(format!("Invalid JSON: {}", source))
                }
                other => findings.error(format!("Error reading file: {}", other)),
            }
            findings
        }
    }
}

/// Validates every collection file in `dir`, in name order
///
/// The index file is not a collection and is skipped.
pub async fn validate_dir(dir: &Path) -> SourceResult<ValidationReport> {
    let sources =
        store::discover_sources(dir, files::JSON_EXTENSION, &[paths::INDEX_FILE]).await?;

    let mut report = ValidationReport::default();
    for path in &sources {
        let findings = validate_file(path).await;
        debug!(
            "{}: {} errors, {} warnings",
            path.display(),
            findings.errors.len(),
            findings.warnings.len()
        );
        report.add(store::file_name(path), findings);
    }

    info!(
        "Validated {} files: {} errors, {} warnings",
        report.summary.total_files, report.summary.total_errors, report.summary.total_warnings
    );
    Ok(report)
}
