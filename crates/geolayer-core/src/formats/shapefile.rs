//! Shapefile format reader implementation
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The first three are required; the optional .prj supplies the CRS.

use async_trait::async_trait;
use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::{PolygonRing, Reader, Shape};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeolayerError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{dataset_name, FormatValidation, LoadStrategy};
use crate::models::{CrsTag, Geometry, RawDataset, Record};

const REQUIRED_COMPONENTS: &[&str] = &["shp", "shx", "dbf"];

/// Shapefile format reader
pub struct ShapefileReader;

#[async_trait]
impl LoadStrategy for ShapefileReader {
    async fn try_load(&self, path: &Path) -> Result<RawDataset> {
        let validation = self.validate(path).await?;
        FormatValidator::validation_to_result(&validation, "Shapefile")?;

        let mut reader = Reader::from_path(path).map_err(|e| {
            GeolayerError::format_error("Shapefile", format!("Failed to open Shapefile: {}", e))
        })?;

        let crs = read_prj(&shapefile_base(path))?;

        let mut rows = Vec::new();
        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result.map_err(|e| {
                GeolayerError::format_error("Shapefile", format!("Failed to read feature: {}", e))
            })?;

            let geometry = convert_shape(&shape)?;
            let mut fields: Vec<(String, String)> = record
                .into_iter()
                .map(|(name, value)| (name, field_to_string(&value)))
                .collect();
            // dBase records are unordered maps
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            rows.push((geometry, fields));
        }

        let columns: Vec<String> = rows
            .first()
            .map(|(_, fields)| fields.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default();

        let records = rows
            .into_iter()
            .map(|(geometry, fields)| {
                Record::new(geometry, fields.into_iter().map(|(_, v)| v).collect())
            })
            .collect();

        Ok(RawDataset {
            name: dataset_name(path),
            format: "Shapefile".to_string(),
            crs,
            columns,
            records,
        })
    }

    fn name(&self) -> &str {
        "shapefile"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let component_validation = FormatValidator::validate_component_files(
            &shapefile_base(path),
            REQUIRED_COMPONENTS,
            &["prj"],
        );

        Ok(FormatValidator::merge_validations(vec![validation, component_validation]))
    }
}

/// Base path for the component files (path without extension)
fn shapefile_base(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Read the CRS declared by the sibling .prj file
pub fn read_prj(base: &Path) -> Result<CrsTag> {
    let prj_path = base.with_extension("prj");
    if !prj_path.exists() {
        return Ok(CrsTag::Absent);
    }

    let content = fs::read_to_string(&prj_path).map_err(|e| {
        GeolayerError::format_error("Shapefile", format!("Failed to read .prj file: {}", e))
    })?;

    Ok(crs_from_prj(&content))
}

/// Interpret .prj contents
///
/// The outermost `AUTHORITY["EPSG", ...]` closes last in WKT, so the last
/// occurrence names the whole CRS. Definitions without an authority are
/// handed to PROJ as-is.
pub fn crs_from_prj(content: &str) -> CrsTag {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return CrsTag::Absent;
    }

    if let Some(code) = last_authority_code(trimmed) {
        return CrsTag::Epsg(code);
    }

    if let Some(rest) = trimmed.strip_prefix("EPSG:") {
        return match rest.trim().parse::<u32>() {
            Ok(code) => CrsTag::Epsg(code),
            Err(_) => CrsTag::Malformed(trimmed.to_string()),
        };
    }

    let upper = trimmed.to_ascii_uppercase();
    let looks_like_wkt = ["GEOGCS[", "PROJCS[", "GEOGCRS[", "PROJCRS[", "COMPD_CS["]
        .iter()
        .any(|keyword| upper.starts_with(keyword));

    if looks_like_wkt {
        CrsTag::Wkt(trimmed.to_string())
    } else {
        CrsTag::Malformed(trimmed.to_string())
    }
}

fn last_authority_code(wkt: &str) -> Option<u32> {
    let compact: String = wkt.chars().filter(|c| !c.is_whitespace()).collect();
    let marker = "AUTHORITY[\"EPSG\",";
    let start = compact.rfind(marker)? + marker.len();
    let digits: String = compact[start..]
        .chars()
        .skip_while(|c| *c == '"')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn part<P>(points: &[P], xy: impl Fn(&P) -> [f64; 2]) -> Vec<[f64; 2]> {
    points.iter().map(xy).collect()
}

fn lines<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> [f64; 2] + Copy) -> Geometry {
    let mut lines: Vec<Vec<[f64; 2]>> = parts.iter().map(|p| part(p, xy)).collect();
    if lines.len() == 1 {
        Geometry::line_string(lines.remove(0))
    } else {
        Geometry::MultiLineString { coordinates: lines }
    }
}

/// Group rings into polygons: each outer ring opens a polygon, inner rings
/// attach to the most recent one.
fn polygons<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> [f64; 2] + Copy) -> Geometry {
    let mut polygons: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();
    for ring in rings {
        let coords = part(ring.points(), xy);
        match ring {
            PolygonRing::Outer(_) => polygons.push(vec![coords]),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some(polygon) => polygon.push(coords),
                None => polygons.push(vec![coords]),
            },
        }
    }

    if polygons.len() == 1 {
        Geometry::polygon(polygons.remove(0))
    } else {
        Geometry::multi_polygon(polygons)
    }
}

/// Convert a shapefile shape, dropping Z and M values
fn convert_shape(shape: &Shape) -> Result<Option<Geometry>> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Geometry::point(p.x, p.y),
        Shape::PointM(p) => Geometry::point(p.x, p.y),
        Shape::PointZ(p) => Geometry::point(p.x, p.y),
        Shape::Polyline(l) => lines(l.parts(), |p| [p.x, p.y]),
        Shape::PolylineM(l) => lines(l.parts(), |p| [p.x, p.y]),
        Shape::PolylineZ(l) => lines(l.parts(), |p| [p.x, p.y]),
        Shape::Polygon(poly) => polygons(poly.rings(), |p| [p.x, p.y]),
        Shape::PolygonM(poly) => polygons(poly.rings(), |p| [p.x, p.y]),
        Shape::PolygonZ(poly) => polygons(poly.rings(), |p| [p.x, p.y]),
        Shape::Multipoint(mp) => Geometry::MultiPoint {
            coordinates: part(mp.points(), |p| [p.x, p.y]),
        },
        Shape::MultipointM(mp) => Geometry::MultiPoint {
            coordinates: part(mp.points(), |p| [p.x, p.y]),
        },
        Shape::MultipointZ(mp) => Geometry::MultiPoint {
            coordinates: part(mp.points(), |p| [p.x, p.y]),
        },
        Shape::Multipatch(_) => {
            return Err(GeolayerError::format_error(
                "Shapefile",
                "Multipatch geometry type is not supported",
            ))
        }
    };
    Ok(Some(geometry))
}

/// Render a dBase field value as a string cell
fn field_to_string(value: &DbaseFieldValue) -> String {
    match value {
        DbaseFieldValue::Character(s) => s.clone().unwrap_or_default(),
        DbaseFieldValue::Numeric(n) => n.map(|n| n.to_string()).unwrap_or_default(),
        DbaseFieldValue::Logical(b) => b.map(|b| b.to_string()).unwrap_or_default(),
        DbaseFieldValue::Date(date) => date
            .as_ref()
            .map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
            .unwrap_or_default(),
        DbaseFieldValue::Float(f) => f.map(|f| f.to_string()).unwrap_or_default(),
        DbaseFieldValue::Integer(i) => i.to_string(),
        DbaseFieldValue::Currency(c) => c.to_string(),
        DbaseFieldValue::DateTime(dt) => format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        ),
        DbaseFieldValue::Double(d) => d.to_string(),
        DbaseFieldValue::Memo(s) => s.clone(),
    }
}
