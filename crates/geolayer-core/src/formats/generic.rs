//! Driverless fallback reader
//!
//! Ignores the file extension and decides how to read the file from its
//! leading content: JSON goes through the GeoJSON parser, anything with a
//! `<kml` root is read as a bare geometry collection.

use async_trait::async_trait;
use kml::Kml;
use std::fs;
use std::path::Path;

use crate::error::{GeolayerError, Result};
use crate::formats::geojson::parse_geojson;
use crate::formats::kml::collect_geometries;
use crate::formats::{dataset_name, LoadStrategy};
use crate::models::{CrsTag, RawDataset, Record, WGS84_EPSG};

/// Content-sniffing strategy with no driver hint
pub struct GenericReader;

/// What the leading bytes of a file look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    Json,
    Kml,
    Unknown,
}

/// Classify file contents by their first significant characters
pub fn sniff(content: &str) -> Sniffed {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('{') {
        return Sniffed::Json;
    }
    if trimmed.starts_with('<') {
        let head: String = trimmed.chars().take(1024).collect::<String>().to_ascii_lowercase();
        if head.contains("<kml") {
            return Sniffed::Kml;
        }
    }
    Sniffed::Unknown
}

#[async_trait]
impl LoadStrategy for GenericReader {
    async fn try_load(&self, path: &Path) -> Result<RawDataset> {
        let bytes = fs::read(path)
            .map_err(|e| GeolayerError::format_error("generic", format!("Failed to open file: {}", e)))?;
        let content = String::from_utf8_lossy(&bytes);
        let name = dataset_name(path);

        match sniff(&content) {
            Sniffed::Json => parse_geojson(&content, name),
            Sniffed::Kml => {
                let kml: Kml = content.parse().map_err(|e| {
                    GeolayerError::format_error("generic", format!("Unreadable KML content: {}", e))
                })?;

                let mut geometries = Vec::new();
                collect_geometries(&kml, &mut geometries)?;

                Ok(RawDataset {
                    name,
                    format: "KML".to_string(),
                    crs: CrsTag::Epsg(WGS84_EPSG),
                    columns: Vec::new(),
                    records: geometries
                        .into_iter()
                        .map(|g| Record::new(Some(g), Vec::new()))
                        .collect(),
                })
            }
            Sniffed::Unknown => Err(GeolayerError::format_error(
                "generic",
                "Content is neither JSON nor KML",
            )),
        }
    }

    fn name(&self) -> &str {
        "generic"
    }
}
