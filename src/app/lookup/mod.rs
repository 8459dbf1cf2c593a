//! Region lookup by coordinate
//!
//! The client asks the municipality service which municipality and county a
//! point falls in. Every failure mode, whether transport, status, body or
//! missing fields, is reported to callers as [`LookupOutcome::NotFound`];
//! the cause is only visible in debug logs.

use std::future::Future;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::app::models::{Coordinate, RegionRecord};
use crate::constants::lookup;
use crate::errors::{ConfigError, ConfigResult};

pub mod config;

pub use config::LookupConfig;

/// Result of a region lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(RegionRecord),
    NotFound,
}

impl LookupOutcome {
    pub fn into_record(self) -> Option<RegionRecord> {
        match self {
            LookupOutcome::Found(record) => Some(record),
            LookupOutcome::NotFound => None,
        }
    }
}

/// Anything that can map a coordinate to a region
///
/// Implemented by [`RegionLookupClient`] for the real service; tests provide
/// in-memory implementations.
pub trait RegionLookup {
    fn lookup(&self, point: Coordinate) -> impl Future<Output = LookupOutcome> + Send;
}

/// Reasons a lookup produced no record; never leaves this module
#[derive(Error, Debug)]
enum LookupFailure {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service responded with HTTP {0}")]
    Status(u16),

    #[error("response lacks field '{0}'")]
    MissingField(&'static str),
}

/// HTTP client for the municipality lookup service
#[derive(Debug, Clone)]
pub struct RegionLookupClient {
    client: Client,
    base_url: Url,
    coordinate_system: u32,
}

impl RegionLookupClient {
    /// Creates a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the base URL does not parse;
    /// HTTP client construction errors are reported the same way.
    pub fn new(config: &LookupConfig) -> ConfigResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "lookup.base_url".to_string(),
            value: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let client = config
            .build_http_client()
            .map_err(|e| ConfigError::InvalidValue {
                field: "lookup".to_string(),
                value: config.user_agent.clone(),
                reason: e.to_string(),
            })?;

        debug!("Created region lookup client for {}", base_url);
        Ok(Self {
            client,
            base_url,
            coordinate_system: config.coordinate_system,
        })
    }

    /// Query URL for a point
    pub fn query_url(&self, point: Coordinate) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("nord", &point.lat.to_string())
            .append_pair("ost", &point.lon.to_string())
            .append_pair("koordsys", &self.coordinate_system.to_string());
        url
    }

    async fn fetch(&self, point: Coordinate) -> Result<RegionRecord, LookupFailure> {
        let url = self.query_url(point);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupFailure::Status(status.as_u16()));
        }
        let body: Value = response.json().await?;
        parse_region(&body)
    }
}

impl RegionLookup for RegionLookupClient {
    async fn lookup(&self, point: Coordinate) -> LookupOutcome {
        match self.fetch(point).await {
            Ok(record) => LookupOutcome::Found(record),
            Err(e) => {
                debug!("No region for ({}, {}): {}", point.lon, point.lat, e);
                LookupOutcome::NotFound
            }
        }
    }
}

/// Extracts a complete region record from a service response
fn parse_region(body: &Value) -> Result<RegionRecord, LookupFailure> {
    Ok(RegionRecord {
        municipality_name: text_field(body, lookup::FIELD_MUNICIPALITY_NAME)?,
        municipality_code: text_field(body, lookup::FIELD_MUNICIPALITY_CODE)?,
        county_name: text_field(body, lookup::FIELD_COUNTY_NAME)?,
        county_code: text_field(body, lookup::FIELD_COUNTY_CODE)?,
    })
}

fn text_field(body: &Value, field: &'static str) -> Result<String, LookupFailure> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(LookupFailure::MissingField(field)),
    }
}
