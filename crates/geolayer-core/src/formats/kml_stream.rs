//! Streaming KML reader
//!
//! A single-pass `quick-xml` scanner that only understands Placemarks and
//! their geometries. It never builds a document tree, so it copes with large
//! files and with documents the DOM driver rejects, at the cost of ignoring
//! folder structure.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use crate::error::{GeolayerError, Result};
use crate::formats::{dataset_name, LoadStrategy};
use crate::models::{ColumnAligner, CrsTag, Geometry, RawDataset, WGS84_EPSG};

/// Fallback KML strategy backed by `quick-xml` events
pub struct KmlStreamReader;

#[async_trait]
impl LoadStrategy for KmlStreamReader {
    async fn try_load(&self, path: &Path) -> Result<RawDataset> {
        let content = fs::read_to_string(path)
            .map_err(|e| GeolayerError::format_error("KML", format!("Failed to open KML file: {}", e)))?;

        let (columns, records) = scan_placemarks(&content)?.finish();

        Ok(RawDataset {
            name: dataset_name(path),
            format: "KML".to_string(),
            crs: CrsTag::Epsg(WGS84_EPSG),
            columns,
            records,
        })
    }

    fn name(&self) -> &str {
        "kml-stream"
    }
}

#[derive(Default)]
struct PlacemarkState {
    name: String,
    description: String,
    properties: Vec<(String, String)>,
    geometries: Vec<Geometry>,
    rings: Vec<Vec<[f64; 2]>>,
    data_key: Option<String>,
}

impl PlacemarkState {
    fn into_row(mut self) -> (Option<Geometry>, Vec<(String, String)>) {
        let geometry = match self.geometries.len() {
            0 => None,
            1 => self.geometries.pop(),
            _ => Some(Geometry::GeometryCollection {
                geometries: self.geometries,
            }),
        };

        let mut properties = vec![
            ("Name".to_string(), self.name),
            ("Description".to_string(), self.description),
        ];
        properties.extend(self.properties);
        (geometry, properties)
    }
}

fn name_attr(element: &BytesStart<'_>) -> Option<String> {
    element
        .try_get_attribute("name")
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn scan_placemarks(content: &str) -> Result<ColumnAligner> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut aligner = ColumnAligner::new();
    let mut stack: Vec<String> = Vec::new();
    let mut placemark: Option<PlacemarkState> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| GeolayerError::format_error("KML", format!("XML error at byte {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match tag.as_str() {
                    "Placemark" => placemark = Some(PlacemarkState::default()),
                    "Data" | "SimpleData" => {
                        if let Some(state) = placemark.as_mut() {
                            state.data_key = name_attr(&e);
                        }
                    }
                    "Polygon" => {
                        if let Some(state) = placemark.as_mut() {
                            state.rings.clear();
                        }
                    }
                    _ => {}
                }
                stack.push(tag);
            }
            Event::End(_) => {
                let Some(tag) = stack.pop() else { continue };
                match tag.as_str() {
                    "Placemark" => {
                        if let Some(state) = placemark.take() {
                            let (geometry, properties) = state.into_row();
                            aligner.push(geometry, properties);
                        }
                    }
                    "Polygon" => {
                        if let Some(state) = placemark.as_mut() {
                            let rings = std::mem::take(&mut state.rings);
                            state.geometries.push(Geometry::polygon(rings));
                        }
                    }
                    "Data" | "SimpleData" => {
                        if let Some(state) = placemark.as_mut() {
                            state.data_key = None;
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| GeolayerError::format_error("KML", e.to_string()))?
                    .into_owned();
                if let Some(state) = placemark.as_mut() {
                    handle_text(state, &stack, value)?;
                }
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                if let Some(state) = placemark.as_mut() {
                    handle_text(state, &stack, value)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(GeolayerError::format_error(
            "KML",
            format!("Unexpected end of document inside <{}>", stack.join("><")),
        ));
    }

    Ok(aligner)
}

fn handle_text(state: &mut PlacemarkState, stack: &[String], value: String) -> Result<()> {
    let Some(current) = stack.last() else { return Ok(()) };
    let parent = stack.len().checked_sub(2).and_then(|i| stack.get(i)).map(String::as_str);

    match (current.as_str(), parent) {
        ("name", Some("Placemark")) => state.name = value,
        ("description", Some("Placemark")) => state.description = value,
        ("value", Some("Data")) | ("SimpleData", _) => {
            if let Some(key) = state.data_key.clone() {
                state.properties.push((key, value));
            }
        }
        ("coordinates", Some(owner)) => {
            let coords = parse_coordinates(&value)?;
            let in_polygon = stack.iter().any(|t| t == "Polygon");
            match owner {
                "Point" => {
                    let [x, y] = coords.first().copied().ok_or_else(|| {
                        GeolayerError::format_error("KML", "Point without coordinates")
                    })?;
                    state.geometries.push(Geometry::point(x, y));
                }
                "LinearRing" if in_polygon => state.rings.push(coords),
                "LineString" | "LinearRing" => state.geometries.push(Geometry::line_string(coords)),
                _ => {}
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parse a KML `<coordinates>` body: whitespace-separated `lon,lat[,alt]` tuples
fn parse_coordinates(text: &str) -> Result<Vec<[f64; 2]>> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',').map(|p| p.trim().parse::<f64>());
            match (parts.next(), parts.next()) {
                (Some(Ok(x)), Some(Ok(y))) => Ok([x, y]),
                _ => Err(GeolayerError::format_error(
                    "KML",
                    format!("Invalid coordinate tuple '{}'", tuple),
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let coords = parse_coordinates("1.5,2.5,0\n  3,4").unwrap();
        assert_eq!(coords, vec![[1.5, 2.5], [3.0, 4.0]]);
        assert!(parse_coordinates("1.5;2.5").is_err());
    }

    #[tokio::test]
    async fn test_stream_reader_placemarks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("route.kml");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Ignored document name</name>
    <Placemark>
      <name>Start</name>
      <description><![CDATA[<i>trailhead</i>]]></description>
      <ExtendedData>
        <Data name="elevation"><value>1200</value></Data>
      </ExtendedData>
      <Point><coordinates>110.44,-7.54,1200</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>Trail</name>
      <LineString><coordinates>110.44,-7.54 110.45,-7.55</coordinates></LineString>
    </Placemark>
  </Document>
</kml>"#,
        )
        .unwrap();

        let result = KmlStreamReader.try_load(&path).await.unwrap();

        assert_eq!(result.name, "route");
        assert_eq!(result.len(), 2);
        assert_eq!(result.columns, vec!["Name", "Description", "elevation"]);
        assert_eq!(result.records[0].attributes, vec!["Start", "<i>trailhead</i>", "1200"]);
        assert_eq!(result.records[0].geometry, Some(Geometry::point(110.44, -7.54)));
        assert_eq!(result.records[1].attributes[2], "");
        assert_eq!(
            result.records[1].geometry,
            Some(Geometry::line_string(vec![[110.44, -7.54], [110.45, -7.55]]))
        );
    }

    #[test]
    fn test_stream_reader_polygon_and_multigeometry() {
        let content = r#"<kml>
  <Placemark>
    <name>Islands</name>
    <MultiGeometry>
      <Polygon>
        <outerBoundaryIs><LinearRing><coordinates>0,0 1,0 1,1 0,0</coordinates></LinearRing></outerBoundaryIs>
      </Polygon>
      <Polygon>
        <outerBoundaryIs><LinearRing><coordinates>5,5 6,5 6,6 5,5</coordinates></LinearRing></outerBoundaryIs>
        <innerBoundaryIs><LinearRing><coordinates>5.2,5.2 5.4,5.2 5.4,5.4 5.2,5.2</coordinates></LinearRing></innerBoundaryIs>
      </Polygon>
    </MultiGeometry>
  </Placemark>
</kml>"#;

        let (_, records) = scan_placemarks(content).unwrap().finish();
        match records[0].geometry.as_ref().unwrap() {
            Geometry::GeometryCollection { geometries } => {
                assert_eq!(geometries.len(), 2);
                match &geometries[1] {
                    Geometry::Polygon { coordinates } => assert_eq!(coordinates.len(), 2),
                    other => panic!("expected polygon, got {:?}", other),
                }
            }
            other => panic!("expected collection, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_reader_truncated_document() {
        let content = "<kml><Placemark><name>cut";
        assert!(scan_placemarks(content).is_err());
    }
}
