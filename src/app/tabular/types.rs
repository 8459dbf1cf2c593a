//! Records, aggregated rows and the aggregate document

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Categorical dimensions, in grouping order
pub const DIMENSIONS: [&str; 6] = [
    "year",
    "vessel_type",
    "gt_group",
    "phase",
    "voyage_type",
    "county_name",
];

/// Position of the period dimension in [`DIMENSIONS`]
pub const PERIOD_DIMENSION: usize = 0;

/// Position of the region dimension in [`DIMENSIONS`]
pub const REGION_DIMENSION: usize = 5;

/// Summed measures, in output order
pub const MEASURES: [&str; 11] = [
    "sum_kwh",
    "sum_kwh_shore_power",
    "sum_kwh_battery",
    "sum_fuel_mdo_equivalent_tonnes",
    "sum_co2_tonnes",
    "sum_co2e_tonnes",
    "sum_nox_tonnes",
    "sum_sox_tonnes",
    "sum_pm10_tonnes",
    "sum_seconds",
    "distance_kilometers",
];

pub const DIMENSION_COUNT: usize = DIMENSIONS.len();
pub const MEASURE_COUNT: usize = MEASURES.len();

/// A categorical value
///
/// Integers order before text, so a column mixing both sorts numbers first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Int(i64),
    Text(String),
}

impl Category {
    pub fn text(value: impl Into<String>) -> Self {
        Category::Text(value.into())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Int(i) => write!(f, "{}", i),
            Category::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Category {
    fn from(value: i64) -> Self {
        Category::Int(value)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::Text(value.to_string())
    }
}

/// Values of the six dimensions; `None` is a missing value
pub type DimensionKey = [Option<Category>; DIMENSION_COUNT];

/// Per-measure sums
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measures(pub [f64; MEASURE_COUNT]);

impl Measures {
    pub fn add(&mut self, other: &Measures) {
        for (sum, value) in self.0.iter_mut().zip(other.0.iter()) {
            *sum += value;
        }
    }

    /// Value of the measure named `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        MEASURES
            .iter()
            .position(|m| *m == name)
            .map(|i| self.0[i])
    }

    fn serialize_into<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for (name, value) in MEASURES.iter().zip(self.0.iter()) {
            map.serialize_entry(name, value)?;
        }
        Ok(())
    }
}

/// One raw row of an extract
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularRecord {
    pub dimensions: DimensionKey,
    pub measures: Measures,
}

impl TabularRecord {
    pub fn region(&self) -> Option<&Category> {
        self.dimensions[REGION_DIMENSION].as_ref()
    }

    pub fn period(&self) -> Option<&Category> {
        self.dimensions[PERIOD_DIMENSION].as_ref()
    }
}

/// Sums for one distinct combination of all six dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub dimensions: DimensionKey,
    pub measures: Measures,
    /// Raw records folded into this row
    pub record_count: usize,
}

impl Serialize for AggregatedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DIMENSION_COUNT + MEASURE_COUNT))?;
        for (name, value) in DIMENSIONS.iter().zip(self.dimensions.iter()) {
            map.serialize_entry(name, value)?;
        }
        self.measures.serialize_into(&mut map)?;
        map.end()
    }
}

/// Sums for one period across every other dimension
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotal {
    pub period: Option<Category>,
    pub measures: Measures,
    pub record_count: usize,
}

impl Serialize for PeriodTotal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + MEASURE_COUNT))?;
        map.serialize_entry(DIMENSIONS[PERIOD_DIMENSION], &self.period)?;
        self.measures.serialize_into(&mut map)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularMetadata {
    pub generated_at: DateTime<Utc>,
    pub description: String,
    pub source: String,
    pub source_files: Vec<String>,
    pub total_raw_records: usize,
    pub aggregated_records: usize,
}

/// Distinct non-missing values per dimension, sorted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub years: Vec<Category>,
    pub vessel_types: Vec<Category>,
    pub gt_groups: Vec<Category>,
    pub phases: Vec<Category>,
    pub voyage_types: Vec<Category>,
    pub counties: Vec<Category>,
}

impl Facets {
    /// Builds facets from per-dimension value lists in [`DIMENSIONS`] order
    pub fn from_dimensions(values: [Vec<Category>; DIMENSION_COUNT]) -> Self {
        let [years, vessel_types, gt_groups, phases, voyage_types, counties] = values;
        Self {
            years,
            vessel_types,
            gt_groups,
            phases,
            voyage_types,
            counties,
        }
    }
}

/// The aggregate document written for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularAggregate {
    pub metadata: TabularMetadata,
    #[serde(rename = "filters")]
    pub facets: Facets,
    pub data: Vec<AggregatedRow>,
    #[serde(rename = "year_totals")]
    pub period_totals: Vec<PeriodTotal>,
}
