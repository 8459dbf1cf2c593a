//! Region lookup client configuration and HTTP client building

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::lookup;

/// Configuration for the region lookup client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Lookup endpoint; coordinates are appended as query parameters
    pub base_url: String,
    /// Coordinate reference system identifier sent with each query
    pub coordinate_system: u32,
    /// Upper bound for one lookup request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Minimum delay between two lookups, imposed by the enricher
    #[serde(with = "humantime_serde")]
    pub inter_call_delay: Duration,
    /// User agent header
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: lookup::BASE_URL.to_string(),
            coordinate_system: lookup::COORDINATE_SYSTEM,
            request_timeout: lookup::REQUEST_TIMEOUT,
            connect_timeout: lookup::CONNECT_TIMEOUT,
            inter_call_delay: lookup::INTER_CALL_DELAY,
            user_agent: lookup::USER_AGENT.to_string(),
        }
    }
}

impl LookupConfig {
    /// Builds the HTTP client with the configured timeouts
    pub fn build_http_client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout.min(self.request_timeout))
            .user_agent(self.user_agent.as_str())
            .build()
    }
}
