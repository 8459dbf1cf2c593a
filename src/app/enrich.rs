//! Region enrichment of grid features
//!
//! Walks a collection in order and attaches municipality and county fields to
//! every feature that lacks them. Features that already carry a municipality
//! are left alone, so a re-run only pays for the features that are still
//! unresolved.

use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::lookup::RegionLookup;
use crate::app::models::Collection;

type Throttle = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-collection enrichment counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    /// Features in the collection
    pub total_features: usize,
    /// Features carrying region data after the run
    pub enriched_features: usize,
    /// Features that already carried region data
    pub already_enriched: usize,
    /// Features enriched by this run
    pub newly_enriched: usize,
    /// Features without a resolvable coordinate
    pub without_coordinate: usize,
    /// Lookups that returned no region
    pub lookup_misses: usize,
}

impl EnrichmentReport {
    /// `(total, enriched)` pair
    pub fn counts(&self) -> (usize, usize) {
        (self.total_features, self.enriched_features)
    }

    /// Number of lookups performed
    pub fn lookups(&self) -> usize {
        self.newly_enriched + self.lookup_misses
    }

    /// Adds another report's counts to this one
    pub fn absorb(&mut self, other: &EnrichmentReport) {
        self.total_features += other.total_features;
        self.enriched_features += other.enriched_features;
        self.already_enriched += other.already_enriched;
        self.newly_enriched += other.newly_enriched;
        self.without_coordinate += other.without_coordinate;
        self.lookup_misses += other.lookup_misses;
    }
}

/// Attaches region data to features using a [`RegionLookup`]
pub struct FeatureEnricher<L> {
    lookup: L,
    throttle: Option<Throttle>,
}

impl<L: RegionLookup> FeatureEnricher<L> {
    /// Creates an enricher that waits at least `inter_call_delay` between lookups
    ///
    /// A zero delay disables throttling.
    pub fn new(lookup: L, inter_call_delay: Duration) -> Self {
        let throttle = Quota::with_period(inter_call_delay).map(Throttle::direct);
        Self { lookup, throttle }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Enriches every unresolved feature of `collection` in place
    pub async fn enrich(&self, collection: &mut Collection) -> EnrichmentReport {
        self.enrich_with_progress(collection, |_| {}).await
    }

    /// Same as [`enrich`](Self::enrich), calling `on_feature` after each feature
    /// with the number of features processed so far
    pub async fn enrich_with_progress<F>(
        &self,
        collection: &mut Collection,
        mut on_feature: F,
    ) -> EnrichmentReport
    where
        F: FnMut(usize),
    {
        let mut report = EnrichmentReport {
            total_features: collection.feature_count(),
            ..Default::default()
        };

        for (position, feature) in collection.features.iter_mut().enumerate() {
            if feature.has_region() {
                report.already_enriched += 1;
                on_feature(position + 1);
                continue;
            }

            let Some(point) = feature.geometry().representative_point() else {
                debug!("{}: no coordinate for '{}'", collection.source_id, feature.name());
                report.without_coordinate += 1;
                on_feature(position + 1);
                continue;
            };

            if let Some(throttle) = &self.throttle {
                throttle.until_ready().await;
            }

            let merged = self
                .lookup
                .lookup(point)
                .await
                .into_record()
                .and_then(|region| feature.merge_region(&region).then_some(region));

            match merged {
                Some(region) => {
                    info!(
                        "  {}: {}, {}",
                        feature.name(),
                        region.municipality_name,
                        region.county_name
                    );
                    report.newly_enriched += 1;
                }
                None => {
                    debug!(
                        "{}: no region for '{}' at ({}, {})",
                        collection.source_id,
                        feature.name(),
                        point.lon,
                        point.lat
                    );
                    report.lookup_misses += 1;
                }
            }
            on_feature(position + 1);
        }

        report.enriched_features = report.already_enriched + report.newly_enriched;
        report
    }
}
