//! Application constants for the elskip data pipelines
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the data root directory
    pub const DATA_DIR: &str = "ELSKIP_DATA_DIR";

    /// Overrides the region lookup service URL
    pub const LOOKUP_URL: &str = "ELSKIP_LOOKUP_URL";
}

/// Region lookup service constants
pub mod lookup {
    use super::Duration;

    /// Kartverket municipality-by-point endpoint
    pub const BASE_URL: &str = "https://api.kartverket.no/kommuneinfo/v1/punkt";

    /// Coordinate reference system sent with every query (WGS84)
    pub const COORDINATE_SYSTEM: u32 = 4326;

    /// User agent for lookup requests
    pub const USER_AGENT: &str = "ElektriskSkipsfart/1.0";

    /// Upper bound for a single lookup request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Minimum delay between two lookups
    pub const INTER_CALL_DELAY: Duration = Duration::from_millis(50);

    /// Response field holding the municipality name
    pub const FIELD_MUNICIPALITY_NAME: &str = "kommunenavn";

    /// Response field holding the municipality code
    pub const FIELD_MUNICIPALITY_CODE: &str = "kommunenummer";

    /// Response field holding the county name
    pub const FIELD_COUNTY_NAME: &str = "fylkesnavn";

    /// Response field holding the county code
    pub const FIELD_COUNTY_CODE: &str = "fylkesnummer";
}

/// Keys used inside grid collection documents
pub mod geojson {
    /// Collection-level `type` value
    pub const FEATURE_COLLECTION: &str = "FeatureCollection";

    /// Feature-level `type` value
    pub const FEATURE: &str = "Feature";

    /// Publisher metadata key
    pub const PUBLISHER: &str = "dcterms:publisher";

    /// Publisher title key inside a publisher entry
    pub const PUBLISHER_TITLE: &str = "dcterms:title";

    /// Provenance timestamp key
    pub const GENERATED_AT: &str = "prov:generatedAt";

    /// JSON-LD value key inside the provenance entry
    pub const LD_VALUE: &str = "@value";
}

/// Feature property keys
pub mod properties {
    /// Site name
    pub const NAME: &str = "name";

    /// Grid owner
    pub const OWNER: &str = "owner";

    /// Available consumption capacity
    pub const AVAILABLE_CONSUMPTION: &str = "availableCons";

    /// Available production capacity
    pub const AVAILABLE_PRODUCTION: &str = "availableProd";

    /// Reserved consumption capacity
    pub const RESERVED_CONSUMPTION: &str = "reservedCons";

    /// Municipality name written by enrichment
    pub const MUNICIPALITY: &str = "kommune";

    /// Municipality code written by enrichment
    pub const MUNICIPALITY_CODE: &str = "kommune_nr";

    /// County name written by enrichment
    pub const COUNTY: &str = "fylke";

    /// County code written by enrichment
    pub const COUNTY_CODE: &str = "fylke_nr";

    /// Properties every feature is expected to carry
    pub const EXPECTED: [&str; 2] = [NAME, OWNER];
}

/// Conventional directory layout under the data root
pub mod paths {
    /// Data root relative to the working directory
    pub const DATA_ROOT: &str = "data";

    /// Grid collection directory under the data root
    pub const GRID_DIR: &str = "grid";

    /// MarU extract directory under the data root
    pub const MARU_DIR: &str = "maru";

    /// Index file name
    pub const INDEX_FILE: &str = "grid_index.json";

    /// Tabular aggregate file name (primary location, inside the MarU directory)
    pub const MARU_OUTPUT_FILE: &str = "maru_dashboard_data.json";

    /// Tabular aggregate file name in the dashboard directory
    pub const MARU_DASHBOARD_FILE: &str = "maru_data.json";

    /// Dashboard public directory
    pub const DASHBOARD_PUBLIC_DIR: &str = "dashboard/public";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Extension of grid collection files
    pub const JSON_EXTENSION: &str = "json";

    /// Extension of spreadsheet extracts
    pub const XLSX_EXTENSION: &str = "xlsx";
}

/// Tabular aggregation constants
pub mod tabular {
    /// Worksheet read from each extract
    pub const SHEET_NAME: &str = "Sheet1";

    /// Region assigned to records without one
    pub const UNKNOWN_REGION: &str = "Unknown";

    /// Source label written into the aggregate metadata
    pub const SOURCE_LABEL: &str = "Kystverket MarU";

    /// Description written into the aggregate metadata
    pub const DESCRIPTION: &str = "MarU Maritime Emissions - Granular Data";
}

/// Index output constants
pub mod index {
    /// Description written into the index metadata
    pub const DESCRIPTION: &str =
        "Index of Norwegian electrical grid capacity data with municipality info";

    /// Name used when a feature has none
    pub const UNKNOWN_NAME: &str = "Unknown";
}

/// Coordinate bounds for WGS84
pub mod bounds {
    /// Longitude range
    pub const LONGITUDE: (f64, f64) = (-180.0, 180.0);

    /// Latitude range
    pub const LATITUDE: (f64, f64) = (-90.0, 90.0);
}

/// Validation report display limits
pub mod report {
    /// Number of findings of each severity printed per file
    pub const FINDINGS_SHOWN_PER_FILE: usize = 3;
}

// Re-export commonly used constants
pub use lookup::USER_AGENT;
