//! CRS reprojection into WGS84

use geolayer_core::error::{GeolayerError, Result};
use geolayer_core::models::{CrsTag, Geometry, WGS84_EPSG};
use proj::Proj;

/// Reprojects geometries from one source CRS into EPSG:4326
pub struct Reprojector {
    proj: Proj,
    source: String,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector").field("source", &self.source).finish()
    }
}

impl Reprojector {
    /// Build a transformation from `crs` to WGS84
    ///
    /// Only present, interpretable CRS tags can be reprojected; absent and
    /// malformed tags are rejected here and handled by the normalizer.
    pub fn to_wgs84(crs: &CrsTag) -> Result<Self> {
        let source = crs.label();
        let definition = crs.proj_definition().ok_or_else(|| GeolayerError::ReprojectionError {
            source_crs: source.clone(),
            reason: "no usable CRS definition".to_string(),
        })?;

        let target = format!("EPSG:{}", WGS84_EPSG);
        let proj = Proj::new_known_crs(&definition, &target, None).map_err(|e| {
            GeolayerError::ReprojectionError {
                source_crs: source.clone(),
                reason: format!("Failed to create projection: {}", e),
            }
        })?;

        Ok(Self { proj, source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn convert(&self, c: [f64; 2]) -> Result<[f64; 2]> {
        let (x, y) = self.proj.convert((c[0], c[1])).map_err(|e| GeolayerError::ReprojectionError {
            source_crs: self.source.clone(),
            reason: format!("Projection failed at ({}, {}): {}", c[0], c[1], e),
        })?;

        if !x.is_finite() || !y.is_finite() {
            return Err(GeolayerError::ReprojectionError {
                source_crs: self.source.clone(),
                reason: format!("Coordinate ({}, {}) projects outside the valid domain", c[0], c[1]),
            });
        }
        Ok([x, y])
    }

    /// Reproject every coordinate of a geometry
    pub fn reproject(&self, geometry: &Geometry) -> Result<Geometry> {
        try_map_coords(geometry, &|c| self.convert(c))
    }
}

/// Apply a fallible coordinate transform to every vertex, preserving structure
pub fn try_map_coords(
    geometry: &Geometry,
    f: &dyn Fn([f64; 2]) -> Result<[f64; 2]>,
) -> Result<Geometry> {
    let line = |coords: &[[f64; 2]]| -> Result<Vec<[f64; 2]>> { coords.iter().map(|c| f(*c)).collect() };
    let rings = |rings: &[Vec<[f64; 2]>]| -> Result<Vec<Vec<[f64; 2]>>> {
        rings.iter().map(|r| line(r)).collect()
    };

    Ok(match geometry {
        Geometry::Point { coordinates } => Geometry::Point { coordinates: f(*coordinates)? },
        Geometry::LineString { coordinates } => Geometry::LineString { coordinates: line(coordinates)? },
        Geometry::Polygon { coordinates } => Geometry::Polygon { coordinates: rings(coordinates)? },
        Geometry::MultiPoint { coordinates } => Geometry::MultiPoint { coordinates: line(coordinates)? },
        Geometry::MultiLineString { coordinates } => {
            Geometry::MultiLineString { coordinates: rings(coordinates)? }
        }
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates.iter().map(|p| rings(p)).collect::<Result<_>>()?,
        },
        Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
            geometries: geometries
                .iter()
                .map(|g| try_map_coords(g, f))
                .collect::<Result<_>>()?,
        },
    })
}

/// True if every coordinate lies within the WGS84 degree range
pub fn within_wgs84_range(geometry: &Geometry) -> bool {
    try_map_coords(geometry, &|c| {
        if (-180.0..=180.0).contains(&c[0]) && (-90.0..=90.0).contains(&c[1]) {
            Ok(c)
        } else {
            Err(GeolayerError::ReprojectionError {
                source_crs: "EPSG:4326".to_string(),
                reason: "out of range".to_string(),
            })
        }
    })
    .is_ok()
}
