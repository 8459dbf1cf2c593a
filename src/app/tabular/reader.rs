//! Spreadsheet extract reading with calamine
//!
//! The first row of the worksheet is the header. Dimension columns are
//! required; measure columns are optional and count as zero when absent.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info, warn};

use super::types::{Category, Measures, TabularRecord, DIMENSIONS, DIMENSION_COUNT, MEASURES};
use crate::app::store;
use crate::constants::files;
use crate::errors::{Result, TabularError, TabularResult};

/// Lists the `*.xlsx` extracts in `dir`, sorted by name
///
/// # Errors
///
/// Fails when the directory cannot be listed or holds no extracts.
pub async fn discover_extracts(dir: &Path) -> Result<Vec<PathBuf>> {
    let extracts = store::discover_sources(dir, files::XLSX_EXTENSION, &[]).await?;
    if extracts.is_empty() {
        return Err(TabularError::NoExtracts {
            path: dir.to_path_buf(),
        }
        .into());
    }
    Ok(extracts)
}

/// Reads every record of one extract on the blocking thread pool
pub async fn load_extract(path: &Path, sheet_name: &str) -> TabularResult<Vec<TabularRecord>> {
    let owned_path = path.to_path_buf();
    let sheet = sheet_name.to_string();
    tokio::task::spawn_blocking(move || read_extract(&owned_path, &sheet))
        .await
        .map_err(|e| TabularError::Interrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
}

/// Reads every record of one extract
///
/// Uses `sheet_name` when the workbook has it, otherwise the first sheet.
pub fn read_extract(path: &Path, sheet_name: &str) -> TabularResult<Vec<TabularRecord>> {
    let workbook_error = |reason: String| TabularError::Workbook {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet = if sheet_names.iter().any(|name| name == sheet_name) {
        sheet_name.to_string()
    } else {
        let first = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| TabularError::NoWorksheets {
                path: path.to_path_buf(),
            })?;
        warn!(
            "{}: no sheet '{}', reading '{}' instead",
            path.display(),
            sheet_name,
            first
        );
        first
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| workbook_error(e.to_string()))?;
    let (rows, cols) = range.get_size();
    debug!("{}: sheet '{}' is {} x {}", path.display(), sheet, rows, cols);

    let records = records_from_rows(path, range.rows())?;
    info!("Loaded {} records from {}", records.len(), store::file_name(path));
    Ok(records)
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct ColumnMap {
    dimensions: [usize; DIMENSION_COUNT],
    measures: Vec<Option<usize>>,
}

impl ColumnMap {
    fn from_header(path: &Path, header: &[Data]) -> TabularResult<Self> {
        let names: Vec<String> = header.iter().map(header_name).collect();
        let position = |wanted: &str| names.iter().position(|name| name == wanted);

        let mut dimensions = [0; DIMENSION_COUNT];
        for (slot, dimension) in dimensions.iter_mut().zip(DIMENSIONS) {
            *slot = position(dimension).ok_or_else(|| TabularError::MissingColumn {
                path: path.to_path_buf(),
                column: dimension.to_string(),
            })?;
        }

        let measures: Vec<Option<usize>> = MEASURES.iter().map(|&m| position(m)).collect();
        for (name, column) in MEASURES.iter().zip(&measures) {
            if column.is_none() {
                warn!("{}: no '{}' column, counting it as 0", path.display(), name);
            }
        }

        Ok(Self {
            dimensions,
            measures,
        })
    }

    fn record(&self, row: &[Data]) -> TabularRecord {
        let mut record = TabularRecord::default();
        for (value, &column) in record.dimensions.iter_mut().zip(&self.dimensions) {
            *value = row.get(column).and_then(dimension_value);
        }
        let mut measures = Measures::default();
        for (sum, column) in measures.0.iter_mut().zip(&self.measures) {
            *sum = column.and_then(|c| row.get(c)).map_or(0.0, measure_value);
        }
        record.measures = measures;
        record
    }
}

/// Converts worksheet rows, header first, into records
pub fn records_from_rows<'a, I>(path: &Path, mut rows: I) -> TabularResult<Vec<TabularRecord>>
where
    I: Iterator<Item = &'a [Data]>,
{
    let header = rows.next().unwrap_or(&[]);
    let columns = ColumnMap::from_header(path, header)?;
    Ok(rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| columns.record(row))
        .collect())
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn dimension_value(cell: &Data) -> Option<Category> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(i) => Some(Category::Int(*i)),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(Category::Int(*f as i64))
        }
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Category::text(trimmed))
        }
        other => Some(Category::Text(other.to_string())),
    }
}

fn measure_value(cell: &Data) -> f64 {
    match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) if f.is_finite() => *f,
        Data::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}
