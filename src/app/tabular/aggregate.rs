//! Group-by aggregation of extract records
//!
//! Every record lands in exactly one granular row and exactly one period
//! total. Groups live in ordered maps keyed by the dimension tuple, so the
//! output order only depends on the dimension values and never on the order
//! extracts were read in.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::config::TabularConfig;
use super::types::{
    AggregatedRow, Category, DimensionKey, Facets, Measures, PeriodTotal, TabularAggregate,
    TabularMetadata, TabularRecord, DIMENSION_COUNT, REGION_DIMENSION,
};

#[derive(Debug, Default)]
struct Accumulator {
    measures: Measures,
    record_count: usize,
}

impl Accumulator {
    fn add(&mut self, record: &TabularRecord) {
        self.measures.add(&record.measures);
        self.record_count += 1;
    }
}

/// Aggregates records into granular rows, period totals and facets
#[derive(Debug, Clone, Default)]
pub struct TabularAggregator {
    config: TabularConfig,
}

impl TabularAggregator {
    pub fn new(config: TabularConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TabularConfig {
        &self.config
    }

    /// Aggregates `records`, stamping the output with the current time
    pub fn aggregate(&self, records: &[TabularRecord], source_files: Vec<String>) -> TabularAggregate {
        self.aggregate_at(records, source_files, Utc::now())
    }

    pub fn aggregate_at(
        &self,
        records: &[TabularRecord],
        source_files: Vec<String>,
        generated_at: DateTime<Utc>,
    ) -> TabularAggregate {
        let data = self.granular_rows(records);
        let period_totals = period_totals(records);
        let facets = facets(records);

        info!(
            "Aggregated {} records into {} rows across {} periods",
            records.len(),
            data.len(),
            period_totals.len()
        );

        TabularAggregate {
            metadata: TabularMetadata {
                generated_at,
                description: self.config.description.clone(),
                source: self.config.source_label.clone(),
                source_files,
                total_raw_records: records.len(),
                aggregated_records: data.len(),
            },
            facets,
            data,
            period_totals,
        }
    }

    /// One row per distinct dimension tuple, missing regions replaced by the
    /// configured label first
    fn granular_rows(&self, records: &[TabularRecord]) -> Vec<AggregatedRow> {
        let mut groups: BTreeMap<DimensionKey, Accumulator> = BTreeMap::new();
        let mut relabelled = 0usize;

        for record in records {
            let mut key = record.dimensions.clone();
            if key[REGION_DIMENSION].is_none() {
                key[REGION_DIMENSION] = Some(Category::text(self.config.unknown_region.as_str()));
                relabelled += 1;
            }
            groups.entry(key).or_default().add(record);
        }

        if relabelled > 0 {
            debug!(
                "{} records without region grouped as '{}'",
                relabelled, self.config.unknown_region
            );
        }

        groups
            .into_iter()
            .map(|(dimensions, acc)| AggregatedRow {
                dimensions,
                measures: acc.measures,
                record_count: acc.record_count,
            })
            .collect()
    }
}

/// Totals per period; a missing period is a group of its own
fn period_totals(records: &[TabularRecord]) -> Vec<PeriodTotal> {
    let mut groups: BTreeMap<Option<Category>, Accumulator> = BTreeMap::new();
    for record in records {
        groups.entry(record.period().cloned()).or_default().add(record);
    }
    groups
        .into_iter()
        .map(|(period, acc)| PeriodTotal {
            period,
            measures: acc.measures,
            record_count: acc.record_count,
        })
        .collect()
}

/// Distinct non-missing raw values of each dimension
fn facets(records: &[TabularRecord]) -> Facets {
    let mut sets: [BTreeSet<&Category>; DIMENSION_COUNT] = Default::default();
    for record in records {
        for (set, value) in sets.iter_mut().zip(record.dimensions.iter()) {
            if let Some(value) = value {
                set.insert(value);
            }
        }
    }
    Facets::from_dimensions(sets.map(|set| set.into_iter().cloned().collect()))
}
