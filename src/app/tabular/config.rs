//! Settings for the extract aggregation

use serde::{Deserialize, Serialize};

use crate::constants::tabular;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    /// Worksheet to read; the first sheet is used when it is absent
    pub sheet_name: String,
    /// Region assigned to records without one
    pub unknown_region: String,
    /// Source label written into the metadata
    pub source_label: String,
    pub description: String,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            sheet_name: tabular::SHEET_NAME.to_string(),
            unknown_region: tabular::UNKNOWN_REGION.to_string(),
            source_label: tabular::SOURCE_LABEL.to_string(),
            description: tabular::DESCRIPTION.to_string(),
        }
    }
}
