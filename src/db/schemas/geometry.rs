//! Location geometry for villages and claims
//!
//! Stored and returned as GeoJSON (`Point` or `Polygon`). The older
//! `{"lat": .., "lng": ..}` shape is still accepted on input and normalised
//! to a `Point`. Coordinates are `[lon, lat]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `[lon, lat]` pair
pub type Position = [f64; 2];

/// Validated GeoJSON geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", try_from = "GeometryInput")]
pub enum Geometry {
    Point(Position),
    /// Linear rings, the first being the exterior
    Polygon(Vec<Vec<Position>>),
}

/// Anything that has a location on the map
pub trait Located {
    fn geometry(&self) -> &Geometry;
}

#[derive(Debug, PartialEq)]
pub struct GeometryError(String);

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GeometryError {}

#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeoJsonShape {
    Point(Position),
    Polygon(Vec<Vec<Position>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeometryInput {
    GeoJson(GeoJsonShape),
    LatLng { lat: f64, lng: f64 },
}

impl TryFrom<GeometryInput> for Geometry {
    type Error = GeometryError;

    fn try_from(input: GeometryInput) -> Result<Self, Self::Error> {
        let geometry = match input {
            GeometryInput::GeoJson(GeoJsonShape::Point(p)) => Geometry::Point(p),
            GeometryInput::GeoJson(GeoJsonShape::Polygon(rings)) => Geometry::Polygon(rings),
            GeometryInput::LatLng { lat, lng } => Geometry::Point([lng, lat]),
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point([lon, lat])
    }

    /// Check coordinate ranges and ring shape
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Geometry::Point(p) => check_position(p),
            Geometry::Polygon(rings) => {
                let exterior = rings
                    .first()
                    .ok_or_else(|| GeometryError("Polygon has no rings".into()))?;
                for ring in rings {
                    if ring.len() < 3 {
                        return Err(GeometryError(
                            "Polygon ring needs at least 3 positions".into(),
                        ));
                    }
                    ring.iter().try_for_each(check_position)?;
                }
                if distinct_vertices(exterior).is_empty() {
                    return Err(GeometryError("Polygon exterior is empty".into()));
                }
                Ok(())
            }
        }
    }

    /// Single `[lon, lat]` used for bbox tests and map markers
    ///
    /// For polygons this is the mean of the exterior ring vertices, not
    /// counting a closing vertex that repeats the first.
    pub fn representative_point(&self) -> Position {
        match self {
            Geometry::Point(p) => *p,
            Geometry::Polygon(rings) => {
                let vertices = rings.first().map(|r| distinct_vertices(r)).unwrap_or(&[]);
                if vertices.is_empty() {
                    return [0.0, 0.0];
                }
                let n = vertices.len() as f64;
                let (lon, lat) = vertices
                    .iter()
                    .fold((0.0, 0.0), |(lon, lat), p| (lon + p[0], lat + p[1]));
                [lon / n, lat / n]
            }
        }
    }
}

fn distinct_vertices(ring: &[Position]) -> &[Position] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn check_position(p: &Position) -> Result<(), GeometryError> {
    let [lon, lat] = *p;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(GeometryError("Coordinates must be finite numbers".into()));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeometryError(format!("Longitude {} out of range", lon)));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeometryError(format!("Latitude {} out of range", lat)));
    }
    Ok(())
}
