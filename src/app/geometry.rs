//! Representative points for feature geometries
//!
//! Grid publishers ship points, polygons and occasionally polygons with extra
//! wrapping arrays. Every shape is reduced to a single coordinate for the
//! region lookup; anything unrecognisable yields no coordinate instead of an
//! error.

use serde_json::Value;

use crate::app::models::Coordinate;

/// Typed view of a feature geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    /// Rings of the polygon, outer ring first
    Polygon(Vec<Vec<Coordinate>>),
    /// Coordinates that could not be interpreted
    Unknown(Value),
}

impl Geometry {
    /// Classifies raw coordinates using the declared type as a hint
    ///
    /// The declared type is trusted only as far as the coordinates allow: a
    /// `Point` with nested arrays is read as a polygon, and an untyped numeric
    /// pair is read as a point.
    pub fn from_raw(kind: Option<&str>, coordinates: &Value) -> Self {
        let items = coordinates.as_array().map(Vec::as_slice).unwrap_or(&[]);

        if kind == Some("Point") {
            if let Some(point) = numeric_pair(items) {
                return Geometry::Point(point);
            }
        }

        let nested = items.first().is_some_and(Value::is_array);
        if kind == Some("Polygon") || nested {
            return match polygon_rings(items) {
                Some(rings) => Geometry::Polygon(rings),
                None => Geometry::Unknown(coordinates.clone()),
            };
        }

        match numeric_pair(items) {
            Some(point) => Geometry::Point(point),
            None => Geometry::Unknown(coordinates.clone()),
        }
    }

    /// Single point used for region lookups
    ///
    /// Polygons resolve to the vertex mean of the outer ring. This is not an
    /// area centroid; vertex-dense stretches pull the result towards them.
    pub fn representative_point(&self) -> Option<Coordinate> {
        match self {
            Geometry::Point(point) => Some(*point),
            Geometry::Polygon(rings) => vertex_mean(rings.first()?),
            Geometry::Unknown(_) => None,
        }
    }
}

/// Resolves a representative coordinate straight from raw geometry parts
pub fn resolve_point(kind: Option<&str>, coordinates: &Value) -> Option<Coordinate> {
    Geometry::from_raw(kind, coordinates).representative_point()
}

fn numeric_pair(items: &[Value]) -> Option<Coordinate> {
    if items.len() < 2 {
        return None;
    }
    Some(Coordinate::new(items[0].as_f64()?, items[1].as_f64()?))
}

/// Descends through first elements until the level below holds numeric pairs
///
/// Returns the rings found at the level above the innermost ring, so a plain
/// ring comes back as a single ring and `[[[ring], [hole]]]` as two.
fn polygon_rings(items: &[Value]) -> Option<Vec<Vec<Coordinate>>> {
    let mut parent: Option<&[Value]> = None;
    let mut current = items;

    loop {
        let first = current.first()?.as_array()?;
        match first.first() {
            Some(Value::Array(_)) => {
                parent = Some(current);
                current = first;
            }
            _ => break,
        }
    }

    let ring_values: Vec<&[Value]> = match parent {
        Some(rings) => rings
            .iter()
            .filter_map(Value::as_array)
            .map(Vec::as_slice)
            .collect(),
        None => vec![current],
    };

    let rings: Vec<Vec<Coordinate>> = ring_values
        .into_iter()
        .map(|ring| {
            ring.iter()
                .filter_map(|vertex| numeric_pair(vertex.as_array()?))
                .collect::<Vec<_>>()
        })
        .collect();

    if rings.first().map_or(true, Vec::is_empty) {
        return None;
    }
    Some(rings)
}

fn vertex_mean(ring: &[Coordinate]) -> Option<Coordinate> {
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let lon = ring.iter().map(|c| c.lon).sum::<f64>() / n;
    let lat = ring.iter().map(|c| c.lat).sum::<f64>() / n;
    Some(Coordinate::new(lon, lat))
}
