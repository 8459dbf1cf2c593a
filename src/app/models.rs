//! Data models for the grid pipelines
//!
//! Features and collections keep the source JSON verbatim so that a
//! read-enrich-write cycle only ever adds the region properties. Typed views
//! (name, geometry, region, capacities) are derived on access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::geometry::Geometry;
use crate::constants::{files, geojson, index, properties};

/// A (longitude, latitude) pair in WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Administrative region attached to a point
///
/// Records are only ever constructed complete; a lookup that yields fewer
/// fields is treated as no record at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub municipality_code: String,
    pub municipality_name: String,
    pub county_code: String,
    pub county_name: String,
}

/// One site in a grid collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(Value);

impl Feature {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Feature properties, if present and an object
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.properties().and_then(|props| props.get(key))
    }

    /// Site name, `"Unknown"` when absent
    pub fn name(&self) -> String {
        match self.property(properties::NAME) {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Null) | None => index::UNKNOWN_NAME.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Declared geometry type, e.g. `"Point"`
    pub fn geometry_type(&self) -> Option<&str> {
        self.0
            .get("geometry")
            .and_then(|g| g.get("type"))
            .and_then(Value::as_str)
    }

    /// Raw geometry coordinates, `Null` when absent
    pub fn raw_coordinates(&self) -> &Value {
        self.0
            .get("geometry")
            .and_then(|g| g.get("coordinates"))
            .unwrap_or(&Value::Null)
    }

    /// Typed geometry view
    pub fn geometry(&self) -> Geometry {
        Geometry::from_raw(self.geometry_type(), self.raw_coordinates())
    }

    /// Numeric capacity property, 0 when absent or not a number
    pub fn capacity(&self, key: &str) -> f64 {
        self.property(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// String-valued region property as stored by enrichment
    pub fn region_field(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// True once the municipality property holds a non-empty value
    pub fn has_region(&self) -> bool {
        match self.property(properties::MUNICIPALITY) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(_) => true,
        }
    }

    /// Merges the region fields into the properties
    ///
    /// Returns `false` without touching anything when the feature is not a
    /// JSON object. A missing or non-object `properties` entry is replaced by
    /// a fresh object.
    pub fn merge_region(&mut self, region: &RegionRecord) -> bool {
        let Some(object) = self.0.as_object_mut() else {
            return false;
        };
        let props = object
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if !props.is_object() {
            *props = Value::Object(Map::new());
        }
        if let Value::Object(props) = props {
            props.insert(
                properties::MUNICIPALITY.to_string(),
                Value::String(region.municipality_name.clone()),
            );
            props.insert(
                properties::MUNICIPALITY_CODE.to_string(),
                Value::String(region.municipality_code.clone()),
            );
            props.insert(
                properties::COUNTY.to_string(),
                Value::String(region.county_name.clone()),
            );
            props.insert(
                properties::COUNTY_CODE.to_string(),
                Value::String(region.county_code.clone()),
            );
        }
        true
    }
}

/// Top-level shape a collection document arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentShape {
    /// `[ { "features": [...] } ]`
    Wrapped,
    /// `{ "features": [...] }`
    Bare,
    /// Anything else; carries no features
    Malformed,
}

/// One source file's normalized set of features
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// File stem of the source
    pub source_id: String,
    /// File name of the source as found on disk
    pub file: String,
    /// Shape of the document on disk, preserved on write-back
    pub shape: DocumentShape,
    /// Collection-level fields other than `features`
    pub metadata: Map<String, Value>,
    pub features: Vec<Feature>,
}

impl Collection {
    pub fn new(source_id: impl Into<String>, shape: DocumentShape) -> Self {
        let source_id = source_id.into();
        Self {
            file: format!("{}.{}", source_id, files::JSON_EXTENSION),
            source_id,
            shape,
            metadata: Map::new(),
            features: Vec::new(),
        }
    }

    /// Publisher title from `dcterms:publisher`, if declared
    pub fn publisher(&self) -> Option<String> {
        let entry = match self.metadata.get(geojson::PUBLISHER)? {
            Value::Array(entries) => entries.first()?,
            obj @ Value::Object(_) => obj,
            _ => return None,
        };
        entry
            .get(geojson::PUBLISHER_TITLE)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Publisher title, falling back to the upper-cased source id
    pub fn publisher_name(&self) -> String {
        self.publisher()
            .unwrap_or_else(|| self.source_id.to_uppercase())
    }

    /// Provenance timestamp from `prov:generatedAt[0]["@value"]`
    pub fn generated_at(&self) -> Option<String> {
        let entry = match self.metadata.get(geojson::GENERATED_AT)? {
            Value::Array(entries) => entries.first()?,
            other => other,
        };
        match entry {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get(geojson::LD_VALUE)
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Rebuilds the on-disk document in the collection's original shape
    ///
    /// Returns `None` for malformed collections, which are never written back.
    pub fn to_document(&self) -> Option<Value> {
        let mut object = self.metadata.clone();
        object.insert(
            "features".to_string(),
            Value::Array(self.features.iter().map(|f| f.as_value().clone()).collect()),
        );
        match self.shape {
            DocumentShape::Wrapped => Some(Value::Array(vec![Value::Object(object)])),
            DocumentShape::Bare => Some(Value::Object(object)),
            DocumentShape::Malformed => None,
        }
    }
}
