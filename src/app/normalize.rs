//! Top-level shape detection for collection documents
//!
//! Publishers deliver either a bare collection object or the same object
//! wrapped in a one-element array. Shape detection happens once, here, so the
//! rest of the pipeline only sees [`Collection`].

use serde_json::{Map, Value};
use tracing::warn;

use crate::app::models::{Collection, DocumentShape, Feature};

/// Normalizes a parsed document into a collection
///
/// Never fails: documents without a `features` array come back as
/// [`DocumentShape::Malformed`] with no features.
pub fn normalize(source_id: &str, document: Value) -> Collection {
    let (shape, object) = match document {
        Value::Array(mut items) if items.len() == 1 && items[0].is_object() => {
            match items.pop() {
                Some(Value::Object(object)) => (DocumentShape::Wrapped, object),
                _ => (DocumentShape::Malformed, Map::new()),
            }
        }
        Value::Object(object) => (DocumentShape::Bare, object),
        _ => (DocumentShape::Malformed, Map::new()),
    };

    into_collection(source_id, shape, object)
}

fn into_collection(source_id: &str, shape: DocumentShape, mut object: Map<String, Value>) -> Collection {
    let features = match object.remove("features") {
        Some(Value::Array(features)) => features,
        other => {
            warn!(
                "{}: no 'features' array found ({}), treating as empty",
                source_id,
                describe(other.as_ref())
            );
            let mut collection = Collection::new(source_id, DocumentShape::Malformed);
            collection.metadata = object;
            return collection;
        }
    };

    let mut collection = Collection::new(source_id, shape);
    collection.metadata = object;
    collection.features = features.into_iter().map(Feature::from_value).collect();
    collection
}

fn describe(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
