//! Canonical geometry and CRS types used across all geolayer crates.
//!
//! These types provide a bridge between GeoJSON serialization and the
//! computational geo crate types.

use serde::{Deserialize, Serialize};

use crate::error::{GeolayerError, Result};

/// EPSG code of WGS 84, the only CRS that leaves the normalizer.
pub const WGS84_EPSG: u32 = 4326;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(WGS84_EPSG, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }
}

/// CRS metadata attached to a freshly loaded dataset.
///
/// Loaders report what the source declared; they never guess. Resolution
/// into WGS84 is the normalizer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CrsTag {
    /// The source carried no CRS information at all.
    #[default]
    Absent,
    /// An authority code (EPSG).
    Epsg(u32),
    /// A projection definition without a resolvable authority code.
    Wkt(String),
    /// CRS information is present but could not be interpreted.
    Malformed(String),
}

impl CrsTag {
    pub fn is_present(&self) -> bool {
        !matches!(self, CrsTag::Absent)
    }

    pub fn is_wgs84(&self) -> bool {
        matches!(self, CrsTag::Epsg(WGS84_EPSG))
    }

    /// Definition string understood by PROJ, if any.
    pub fn proj_definition(&self) -> Option<String> {
        match self {
            CrsTag::Epsg(code) => Some(format!("EPSG:{}", code)),
            CrsTag::Wkt(wkt) => Some(wkt.clone()),
            CrsTag::Absent | CrsTag::Malformed(_) => None,
        }
    }

    /// Short label for logs and error messages
    pub fn label(&self) -> String {
        match self {
            CrsTag::Absent => "none".to_string(),
            CrsTag::Epsg(code) => format!("EPSG:{}", code),
            CrsTag::Wkt(_) => "WKT definition".to_string(),
            CrsTag::Malformed(raw) => format!("malformed CRS '{}'", raw),
        }
    }
}

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeometryType {
    #[default]
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

/// GeoJSON-compatible geometry representation
///
/// This enum directly maps to GeoJSON geometry types with `[x, y]`
/// (longitude, latitude) coordinate arrays. Z and M ordinates are dropped
/// when converting from source formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates: coords }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Create a MultiPolygon geometry
    pub fn multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
        Geometry::MultiPolygon { coordinates: polygons }
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
            Geometry::GeometryCollection { .. } => GeometryType::GeometryCollection,
        }
    }

    /// True for Multi* geometries and geometry collections
    pub fn is_multipart(&self) -> bool {
        !matches!(
            self,
            Geometry::Point { .. } | Geometry::LineString { .. } | Geometry::Polygon { .. }
        )
    }

    /// Try to parse from a serde_json::Value (GeoJSON)
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        let geometry = geojson::Geometry::from_json_value(value.clone()).ok()?;
        Geometry::try_from(&geometry).ok()
    }

    /// Convert to serde_json::Value (GeoJSON)
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn position(pos: &[f64]) -> Result<[f64; 2]> {
    match pos {
        [x, y, ..] => Ok([*x, *y]),
        _ => Err(GeolayerError::format_error(
            "GeoJSON",
            format!("position needs at least two ordinates, got {}", pos.len()),
        )),
    }
}

fn positions(line: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
    line.iter().map(|p| position(p)).collect()
}

fn rings(polygon: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<[f64; 2]>>> {
    polygon.iter().map(|ring| positions(ring)).collect()
}

impl TryFrom<&geojson::Geometry> for Geometry {
    type Error = GeolayerError;

    fn try_from(geometry: &geojson::Geometry) -> Result<Self> {
        use geojson::Value;

        Ok(match &geometry.value {
            Value::Point(p) => Geometry::Point { coordinates: position(p)? },
            Value::MultiPoint(points) => Geometry::MultiPoint { coordinates: positions(points)? },
            Value::LineString(line) => Geometry::LineString { coordinates: positions(line)? },
            Value::MultiLineString(lines) => Geometry::MultiLineString {
                coordinates: lines.iter().map(|l| positions(l)).collect::<Result<_>>()?,
            },
            Value::Polygon(polygon) => Geometry::Polygon { coordinates: rings(polygon)? },
            Value::MultiPolygon(polygons) => Geometry::MultiPolygon {
                coordinates: polygons.iter().map(|p| rings(p)).collect::<Result<_>>()?,
            },
            Value::GeometryCollection(geometries) => Geometry::GeometryCollection {
                geometries: geometries.iter().map(Geometry::try_from).collect::<Result<_>>()?,
            },
        })
    }
}

fn to_position(coord: &[f64; 2]) -> Vec<f64> {
    vec![coord[0], coord[1]]
}

fn to_line(coords: &[[f64; 2]]) -> Vec<Vec<f64>> {
    coords.iter().map(to_position).collect()
}

fn to_rings(rings: &[Vec<[f64; 2]>]) -> Vec<Vec<Vec<f64>>> {
    rings.iter().map(|ring| to_line(ring)).collect()
}

impl From<&Geometry> for geojson::Geometry {
    fn from(geometry: &Geometry) -> Self {
        use geojson::Value;

        let value = match geometry {
            Geometry::Point { coordinates } => Value::Point(to_position(coordinates)),
            Geometry::LineString { coordinates } => Value::LineString(to_line(coordinates)),
            Geometry::Polygon { coordinates } => Value::Polygon(to_rings(coordinates)),
            Geometry::MultiPoint { coordinates } => Value::MultiPoint(to_line(coordinates)),
            Geometry::MultiLineString { coordinates } => Value::MultiLineString(to_rings(coordinates)),
            Geometry::MultiPolygon { coordinates } => {
                Value::MultiPolygon(coordinates.iter().map(|p| to_rings(p)).collect())
            }
            Geometry::GeometryCollection { geometries } => {
                Value::GeometryCollection(geometries.iter().map(geojson::Geometry::from).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_serialization() {
        let point = Geometry::point(115.0, -8.5);
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("Point"));
        assert!(json.contains("115"));

        let parsed: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(point, parsed);
    }

    #[test]
    fn test_geojson_conversion_drops_z() {
        let value = serde_json::json!({
            "type": "LineString",
            "coordinates": [[1.0, 2.0, 30.0], [3.0, 4.0, 40.0]]
        });
        let geometry = Geometry::from_geojson(&value).unwrap();
        assert_eq!(geometry, Geometry::line_string(vec![[1.0, 2.0], [3.0, 4.0]]));
    }

    #[test]
    fn test_short_position_rejected() {
        let geometry = geojson::Geometry::new(geojson::Value::Point(vec![1.0]));
        assert!(Geometry::try_from(&geometry).is_err());
    }

    #[test]
    fn test_multipart_classification() {
        assert!(!Geometry::point(0.0, 0.0).is_multipart());
        assert!(Geometry::multi_polygon(vec![]).is_multipart());
        assert!(Geometry::GeometryCollection { geometries: vec![] }.is_multipart());
    }

    #[test]
    fn test_crs_tag_definitions() {
        assert_eq!(CrsTag::Epsg(3857).proj_definition().as_deref(), Some("EPSG:3857"));
        assert!(CrsTag::Absent.proj_definition().is_none());
        assert!(CrsTag::Malformed("foo".into()).proj_definition().is_none());
        assert!(CrsTag::Epsg(4326).is_wgs84());
        assert!(!CrsTag::Absent.is_present());
    }
}
