//! KML (Keyhole Markup Language) DOM reader
//!
//! Parses the whole document with the `kml` crate, walks documents and
//! folders recursively, and turns every Placemark into one record. Placemark
//! name, description, folder path, and ExtendedData values become attributes.

use async_trait::async_trait;
use kml::types::Element;
use kml::Kml;
use std::fs;
use std::path::Path;

use crate::error::{GeolayerError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{dataset_name, FormatValidation, LoadStrategy};
use crate::models::{ColumnAligner, CrsTag, Geometry, RawDataset, WGS84_EPSG};

/// Primary KML strategy backed by the `kml` crate
pub struct KmlDriver;

#[async_trait]
impl LoadStrategy for KmlDriver {
    async fn try_load(&self, path: &Path) -> Result<RawDataset> {
        let validation = self.validate(path).await?;
        FormatValidator::validation_to_result(&validation, "KML")?;

        let content = fs::read_to_string(path)
            .map_err(|e| GeolayerError::format_error("KML", format!("Failed to open KML file: {}", e)))?;

        let kml: Kml = content
            .parse()
            .map_err(|e| GeolayerError::format_error("KML", format!("Failed to parse KML: {}", e)))?;

        let mut aligner = ColumnAligner::new();
        extract_features_recursive(&kml, &mut aligner, &[])?;
        let (columns, records) = aligner.finish();

        Ok(RawDataset {
            name: dataset_name(path),
            format: "KML".to_string(),
            // KML coordinates are WGS84 by definition
            crs: CrsTag::Epsg(WGS84_EPSG),
            columns,
            records,
        })
    }

    fn name(&self) -> &str {
        "kml-driver"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let xml_validation = FormatValidator::validate_xml_structure(path);
        Ok(FormatValidator::merge_validations(vec![validation, xml_validation]))
    }
}

/// Recursively extract placemarks, tracking the folder hierarchy
fn extract_features_recursive(
    kml: &Kml,
    aligner: &mut ColumnAligner,
    folder_path: &[String],
) -> Result<()> {
    match kml {
        Kml::KmlDocument(doc) => {
            for element in &doc.elements {
                extract_features_recursive(element, aligner, folder_path)?;
            }
        }
        Kml::Document { elements, .. } => {
            for element in elements {
                extract_features_recursive(element, aligner, folder_path)?;
            }
        }
        Kml::Folder { attrs, elements } => {
            let mut nested = folder_path.to_vec();
            let folder_name = attrs.get("name").cloned().or_else(|| {
                elements.iter().find_map(|e| match e {
                    Kml::Element(el) if el.name == "name" => el.content.clone(),
                    _ => None,
                })
            });
            if let Some(name) = folder_name {
                nested.push(name);
            }

            for element in elements {
                extract_features_recursive(element, aligner, &nested)?;
            }
        }
        Kml::Placemark(placemark) => {
            let geometry = placemark.geometry.as_ref().map(convert_geometry).transpose()?;

            let mut properties = Vec::new();
            properties.push((
                "Name".to_string(),
                placemark.name.clone().unwrap_or_default(),
            ));
            properties.push((
                "Description".to_string(),
                placemark.description.clone().unwrap_or_default(),
            ));
            if !folder_path.is_empty() {
                properties.push(("folder_path".to_string(), folder_path.join("/")));
            }
            for child in &placemark.children {
                if child.name == "ExtendedData" {
                    extended_data(child, &mut properties);
                }
            }

            aligner.push(geometry, properties);
        }
        _ => {
            // NetworkLink, GroundOverlay, styles and other non-feature elements
        }
    }

    Ok(())
}

/// Collect `<Data name><value>` and `<SchemaData><SimpleData name>` pairs
fn extended_data(element: &Element, properties: &mut Vec<(String, String)>) {
    for child in &element.children {
        match child.name.as_str() {
            "Data" => {
                if let Some(key) = child.attrs.get("name") {
                    let value = child
                        .children
                        .iter()
                        .find(|c| c.name == "value")
                        .and_then(|c| c.content.clone())
                        .unwrap_or_default();
                    properties.push((key.clone(), value));
                }
            }
            "SchemaData" => {
                for simple in child.children.iter().filter(|c| c.name == "SimpleData") {
                    if let Some(key) = simple.attrs.get("name") {
                        properties.push((key.clone(), simple.content.clone().unwrap_or_default()));
                    }
                }
            }
            _ => {}
        }
    }
}

fn coords(coords: &[kml::types::Coord]) -> Vec<[f64; 2]> {
    coords.iter().map(|c| [c.x, c.y]).collect()
}

fn convert_polygon(polygon: &kml::types::Polygon) -> Geometry {
    let mut rings = vec![coords(&polygon.outer.coords)];
    rings.extend(polygon.inner.iter().map(|ring| coords(&ring.coords)));
    Geometry::polygon(rings)
}

fn convert_multi_geometry(multi: &kml::types::MultiGeometry) -> Result<Geometry> {
    Ok(Geometry::GeometryCollection {
        geometries: multi
            .geometries
            .iter()
            .map(convert_geometry)
            .collect::<Result<_>>()?,
    })
}

/// Convert a KML geometry into the canonical geometry type
pub fn convert_geometry(geometry: &kml::types::Geometry) -> Result<Geometry> {
    match geometry {
        kml::types::Geometry::Point(point) => Ok(Geometry::point(point.coord.x, point.coord.y)),
        kml::types::Geometry::LineString(line) => Ok(Geometry::line_string(coords(&line.coords))),
        kml::types::Geometry::LinearRing(ring) => Ok(Geometry::line_string(coords(&ring.coords))),
        kml::types::Geometry::Polygon(polygon) => Ok(convert_polygon(polygon)),
        kml::types::Geometry::MultiGeometry(multi) => convert_multi_geometry(multi),
        _ => Err(GeolayerError::format_error("KML", "Unsupported geometry type")),
    }
}

/// Collect every geometry in a KML tree, with or without a Placemark around it
pub fn collect_geometries(kml: &Kml, out: &mut Vec<Geometry>) -> Result<()> {
    match kml {
        Kml::KmlDocument(doc) => {
            for element in &doc.elements {
                collect_geometries(element, out)?;
            }
        }
        Kml::Document { elements, .. } | Kml::Folder { elements, .. } => {
            for element in elements {
                collect_geometries(element, out)?;
            }
        }
        Kml::Placemark(placemark) => {
            if let Some(geometry) = &placemark.geometry {
                out.push(convert_geometry(geometry)?);
            }
        }
        Kml::Point(point) => out.push(Geometry::point(point.coord.x, point.coord.y)),
        Kml::LineString(line) => out.push(Geometry::line_string(coords(&line.coords))),
        Kml::LinearRing(ring) => out.push(Geometry::line_string(coords(&ring.coords))),
        Kml::Polygon(polygon) => out.push(convert_polygon(polygon)),
        Kml::MultiGeometry(multi) => out.push(convert_multi_geometry(multi)?),
        _ => {}
    }
    Ok(())
}
