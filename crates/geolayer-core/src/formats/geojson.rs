//! GeoJSON format reader implementation

use async_trait::async_trait;
use std::fs;
use std::path::Path;

use crate::error::{GeolayerError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{dataset_name, FormatValidation, LoadStrategy};
use crate::models::{stringify_value, ColumnAligner, CrsTag, Geometry, RawDataset, WGS84_EPSG};

/// GeoJSON format reader
pub struct GeoJsonReader;

#[async_trait]
impl LoadStrategy for GeoJsonReader {
    async fn try_load(&self, path: &Path) -> Result<RawDataset> {
        let validation = self.validate(path).await?;
        FormatValidator::validation_to_result(&validation, "GeoJSON")?;

        let content = fs::read_to_string(path)
            .map_err(|e| GeolayerError::format_error("GeoJSON", format!("Failed to open file: {}", e)))?;

        parse_geojson(&content, dataset_name(path))
    }

    fn name(&self) -> &str {
        "geojson"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let json_validation = FormatValidator::validate_json_structure(path);
        Ok(FormatValidator::merge_validations(vec![validation, json_validation]))
    }
}

/// Parse GeoJSON text into a raw dataset
///
/// Accepts a FeatureCollection, a single Feature, or a bare Geometry. Only a
/// FeatureCollection can carry a `crs` member; the other forms report
/// `CrsTag::Absent`.
pub fn parse_geojson(content: &str, name: String) -> Result<RawDataset> {
    let geojson: geojson::GeoJson = content
        .parse()
        .map_err(|e| GeolayerError::format_error("GeoJSON", format!("Failed to parse GeoJSON: {}", e)))?;

    let mut aligner = ColumnAligner::new();

    let crs = match &geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                push_feature(&mut aligner, feature)?;
            }
            match fc.foreign_members.as_ref().and_then(|fm| fm.get("crs")) {
                Some(member) => crs_from_member(member),
                None => CrsTag::Absent,
            }
        }
        geojson::GeoJson::Feature(feature) => {
            push_feature(&mut aligner, feature)?;
            CrsTag::Absent
        }
        geojson::GeoJson::Geometry(geometry) => {
            aligner.push(Some(Geometry::try_from(geometry)?), Vec::new());
            CrsTag::Absent
        }
    };

    let (columns, records) = aligner.finish();

    Ok(RawDataset {
        name,
        format: "GeoJSON".to_string(),
        crs,
        columns,
        records,
    })
}

fn push_feature(aligner: &mut ColumnAligner, feature: &geojson::Feature) -> Result<()> {
    let geometry = feature.geometry.as_ref().map(Geometry::try_from).transpose()?;

    let properties = feature
        .properties
        .as_ref()
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), stringify_value(v)))
                .collect()
        })
        .unwrap_or_default();

    aligner.push(geometry, properties);
    Ok(())
}

/// Interpret a legacy GeoJSON `crs` member
///
/// Recognises `EPSG:n`, `urn:ogc:def:crs:EPSG::n` and the OGC CRS84 name.
/// Anything else that is present is reported as malformed rather than guessed.
pub fn crs_from_member(member: &serde_json::Value) -> CrsTag {
    if member.is_null() {
        return CrsTag::Absent;
    }

    let Some(name) = member
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str())
    else {
        return CrsTag::Malformed(member.to_string());
    };

    let upper = name.trim().to_ascii_uppercase();
    if upper.ends_with("CRS84") {
        return CrsTag::Epsg(WGS84_EPSG);
    }

    if upper.contains("EPSG") {
        let code = upper.rsplit(':').find(|part| !part.is_empty());
        if let Some(code) = code.and_then(|c| c.parse::<u32>().ok()) {
            return CrsTag::Epsg(code);
        }
    }

    CrsTag::Malformed(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_geojson_reader_feature_collection() {
        let reader = GeoJsonReader;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("wells.geojson");

        let geojson_content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [106.8, -6.2] },
                    "properties": { "name": "North", "depth": 12 }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [106.9, -6.3] },
                    "properties": { "name": "South", "active": true }
                }
            ]
        }"#;

        fs::write(&file_path, geojson_content).unwrap();

        let result = reader.try_load(&file_path).await.unwrap();

        assert_eq!(result.name, "wells");
        assert_eq!(result.format, "GeoJSON");
        assert_eq!(result.crs, CrsTag::Absent);
        assert_eq!(result.len(), 2);
        assert_eq!(result.columns.len(), 3);

        let depth = result.columns.iter().position(|c| c == "depth").unwrap();
        let active = result.columns.iter().position(|c| c == "active").unwrap();
        assert_eq!(result.records[0].attributes[depth], "12");
        assert_eq!(result.records[1].attributes[depth], "");
        assert_eq!(result.records[1].attributes[active], "true");
    }

    #[tokio::test]
    async fn test_geojson_reader_single_feature() {
        let reader = GeoJsonReader;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("single.geojson");

        fs::write(
            &file_path,
            r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": null}"#,
        )
        .unwrap();

        let result = reader.try_load(&file_path).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.records[0].geometry, Some(Geometry::point(1.0, 2.0)));
        assert!(result.columns.is_empty());
    }

    #[test]
    fn test_null_geometry_is_kept_for_normalizer() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "geometry": null, "properties": { "id": 1 } }]
        }"#;

        let result = parse_geojson(content, "nulls".to_string()).unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result.has_geometry());
    }

    #[test]
    fn test_crs_member_parsing() {
        let named = |name: &str| json!({ "type": "name", "properties": { "name": name } });

        assert_eq!(crs_from_member(&named("EPSG:3857")), CrsTag::Epsg(3857));
        assert_eq!(crs_from_member(&named("urn:ogc:def:crs:EPSG::32748")), CrsTag::Epsg(32748));
        assert_eq!(crs_from_member(&named("urn:ogc:def:crs:OGC:1.3:CRS84")), CrsTag::Epsg(4326));
        assert_eq!(
            crs_from_member(&named("EPSG:notanumber")),
            CrsTag::Malformed("EPSG:notanumber".to_string())
        );
        assert!(matches!(crs_from_member(&json!({ "type": "link" })), CrsTag::Malformed(_)));
        assert_eq!(crs_from_member(&serde_json::Value::Null), CrsTag::Absent);
    }

    #[test]
    fn test_crs_member_on_collection() {
        let content = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::3857" } },
            "features": [{ "type": "Feature", "geometry": { "type": "Point", "coordinates": [0, 0] }, "properties": {} }]
        }"#;

        let result = parse_geojson(content, "merc".to_string()).unwrap();
        assert_eq!(result.crs, CrsTag::Epsg(3857));
    }

    #[tokio::test]
    async fn test_geojson_reader_rejects_invalid_json() {
        let reader = GeoJsonReader;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("invalid.geojson");
        fs::write(&file_path, "not valid json").unwrap();

        let validation = reader.validate(&file_path).await.unwrap();
        assert!(!validation.is_valid());

        let err = reader.try_load(&file_path).await.unwrap_err();
        assert!(matches!(err, GeolayerError::FormatError { .. }));
        assert!(err.to_string().contains("Invalid JSON structure"));
    }
}
