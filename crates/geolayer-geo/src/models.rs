//! Conversions between the canonical geometry and the `geo` crate types.

use geo::Geometry as GeoGeometry;

pub use geolayer_core::models::{BoundingBox, CrsTag, Geometry, GeometryType};

fn coord(c: &[f64; 2]) -> geo::Coord {
    geo::Coord { x: c[0], y: c[1] }
}

fn line(coords: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(coord).collect())
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => {
            geo::Polygon::new(line(exterior), interiors.iter().map(|r| line(r)).collect())
        }
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => GeoGeometry::Point(geo::Point(coord(coordinates))),
        Geometry::LineString { coordinates } => GeoGeometry::LineString(line(coordinates)),
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => GeoGeometry::MultiPoint(geo::MultiPoint::new(
            coordinates.iter().map(|c| geo::Point(coord(c))).collect(),
        )),
        Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
            geo::MultiLineString::new(coordinates.iter().map(|l| line(l)).collect()),
        ),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(
            geo::MultiPolygon::new(coordinates.iter().map(|p| polygon(p)).collect()),
        ),
        Geometry::GeometryCollection { geometries } => GeoGeometry::GeometryCollection(
            geo::GeometryCollection(geometries.iter().map(to_geo_geometry).collect()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_rings_split_into_exterior_and_holes() {
        let geometry = Geometry::polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
        ]);

        match to_geo_geometry(&geometry) {
            GeoGeometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 4);
                assert_eq!(p.interiors().len(), 1);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_collection_conversion() {
        let geometry = Geometry::GeometryCollection {
            geometries: vec![Geometry::point(1.0, 2.0), Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]])],
        };

        match to_geo_geometry(&geometry) {
            GeoGeometry::GeometryCollection(gc) => assert_eq!(gc.0.len(), 2),
            other => panic!("expected collection, got {:?}", other),
        }
    }
}
