//! Geometry normalization
//!
//! Turns a `RawDataset` into a `FeatureDataset` whose records all carry a
//! single-part WGS84 geometry. The steps run in a fixed order: emptiness
//! check, CRS resolution, multipart explosion.

use geolayer_core::error::{GeolayerError, Result};
use geolayer_core::models::{CrsTag, FeatureDataset, Geometry, RawDataset, Record};
use serde::Serialize;

use crate::transform::Reprojector;

/// What the normalizer did to a dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    pub input_records: usize,
    pub output_records: usize,
    /// Records dropped because they had no geometry
    pub dropped_null: usize,
    /// Source CRS label when coordinates were transformed
    pub reprojected_from: Option<String>,
    /// True when no CRS was declared and WGS84 was assigned
    pub crs_assumed: bool,
    /// Multipart records split into their parts
    pub exploded: usize,
    /// Multipart records dropped because they had no parts
    pub dropped_empty: usize,
}

/// Normalizes loader output into WGS84 single-part datasets
#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: RawDataset) -> Result<(FeatureDataset, NormalizeReport)> {
        let mut report = NormalizeReport {
            input_records: raw.len(),
            ..Default::default()
        };

        if raw.is_empty() {
            return Err(GeolayerError::EmptyOrNoGeometry {
                reason: format!("{} contains no records", raw.name),
            });
        }
        if !raw.has_geometry() {
            return Err(GeolayerError::EmptyOrNoGeometry {
                reason: format!("{} has no geometry column", raw.name),
            });
        }

        let RawDataset { name, crs, columns, records, .. } = raw;

        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            match record.geometry {
                Some(geometry) => kept.push((geometry, record.attributes)),
                None => report.dropped_null += 1,
            }
        }
        if report.dropped_null > 0 {
            tracing::debug!(dataset = %name, dropped = report.dropped_null, "Dropped records without geometry");
        }

        let kept = match &crs {
            CrsTag::Absent => {
                tracing::info!(dataset = %name, "No CRS declared, assigning EPSG:4326");
                report.crs_assumed = true;
                kept
            }
            tag if tag.is_wgs84() => kept,
            CrsTag::Malformed(raw_crs) => {
                return Err(GeolayerError::ReprojectionError {
                    source_crs: crs.label(),
                    reason: format!("unrecognised CRS definition '{}'", raw_crs),
                })
            }
            tag => {
                let reprojector = Reprojector::to_wgs84(tag)?;
                let reprojected = kept
                    .into_iter()
                    .map(|(geometry, attributes)| -> Result<_> {
                        Ok((reprojector.reproject(&geometry)?, attributes))
                    })
                    .collect::<Result<Vec<_>>>()?;

                tracing::info!(
                    dataset = %name,
                    source_crs = reprojector.source(),
                    records = reprojected.len(),
                    "Reprojected to EPSG:4326"
                );
                report.reprojected_from = Some(reprojector.source().to_string());
                reprojected
            }
        };

        let (records, exploded, dropped_empty) = explode_all(kept);
        report.exploded = exploded;
        report.dropped_empty = dropped_empty;
        if dropped_empty > 0 {
            tracing::warn!(dataset = %name, dropped = dropped_empty, "Dropped multipart records without parts");
        }
        if records.is_empty() {
            return Err(GeolayerError::EmptyOrNoGeometry {
                reason: format!("{} has only empty geometries", name),
            });
        }

        report.output_records = records.len();
        Ok((FeatureDataset::new(columns, records), report))
    }
}

/// Split every multipart geometry; returns the records, how many inputs were
/// split and how many were dropped for having no parts
fn explode_all(rows: Vec<(Geometry, Vec<String>)>) -> (Vec<Record>, usize, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut exploded = 0;
    let mut dropped = 0;

    for (geometry, attributes) in rows {
        if !geometry.is_multipart() {
            records.push(Record::new(Some(geometry), attributes));
            continue;
        }

        let mut parts = Vec::new();
        explode(&geometry, &mut parts);
        if parts.is_empty() {
            dropped += 1;
            continue;
        }

        exploded += 1;
        records.extend(
            parts
                .into_iter()
                .map(|part| Record::new(Some(part), attributes.clone())),
        );
    }

    (records, exploded, dropped)
}

/// Append the single-part constituents of `geometry` to `parts`
///
/// Empty multiparts, including empty collection members, contribute nothing.
pub fn explode(geometry: &Geometry, parts: &mut Vec<Geometry>) {
    match geometry {
        Geometry::MultiPoint { coordinates } => {
            parts.extend(coordinates.iter().map(|c| Geometry::Point { coordinates: *c }));
        }
        Geometry::MultiLineString { coordinates } => {
            parts.extend(coordinates.iter().cloned().map(Geometry::line_string));
        }
        Geometry::MultiPolygon { coordinates } => {
            parts.extend(coordinates.iter().cloned().map(Geometry::polygon));
        }
        Geometry::GeometryCollection { geometries } => {
            for member in geometries {
                explode(member, parts);
            }
        }
        single => parts.push(single.clone()),
    }
}
