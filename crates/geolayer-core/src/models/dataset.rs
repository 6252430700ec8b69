use serde::{Deserialize, Serialize};

use super::geometry::{CrsTag, Geometry};

/// One feature: an optional geometry plus attribute values aligned to the
/// owning dataset's column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub geometry: Option<Geometry>,
    pub attributes: Vec<String>,
}

impl Record {
    pub fn new(geometry: Option<Geometry>, attributes: Vec<String>) -> Self {
        Self { geometry, attributes }
    }
}

/// Dataset as produced by a loader, before normalization.
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// Dataset name (file stem of the loaded file)
    pub name: String,

    /// Format name (e.g., "KML", "GeoJSON", "Shapefile")
    pub format: String,

    /// CRS as declared by the source
    pub crs: CrsTag,

    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if at least one record carries a geometry
    pub fn has_geometry(&self) -> bool {
        self.records.iter().any(|r| r.geometry.is_some())
    }
}

/// Normalized dataset: every record has a single-part WGS84 geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl FeatureDataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records as (column, value) pairs in column order
    pub fn attribute_pairs<'a>(
        &'a self,
        record: &'a Record,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.columns
            .iter()
            .zip(record.attributes.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }

    /// Build a GeoJSON FeatureCollection without a `crs` member.
    ///
    /// Records without geometry are emitted with a null geometry.
    pub fn to_feature_collection(&self) -> geojson::FeatureCollection {
        let features = self
            .records
            .iter()
            .map(|record| {
                let properties: serde_json::Map<String, serde_json::Value> = self
                    .attribute_pairs(record)
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect();

                geojson::Feature {
                    bbox: None,
                    geometry: record.geometry.as_ref().map(geojson::Geometry::from),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Accumulates records from formats with per-feature property maps and
/// aligns them to one column list (first-seen order).
#[derive(Debug, Default)]
pub struct ColumnAligner {
    columns: Vec<String>,
    rows: Vec<(Option<Geometry>, Vec<(String, String)>)>,
}

impl ColumnAligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, geometry: Option<Geometry>, properties: Vec<(String, String)>) {
        for (key, _) in &properties {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push((geometry, properties));
    }

    pub fn finish(self) -> (Vec<String>, Vec<Record>) {
        let columns = self.columns;
        let records = self
            .rows
            .into_iter()
            .map(|(geometry, properties)| {
                let attributes = columns
                    .iter()
                    .map(|column| {
                        properties
                            .iter()
                            .find(|(k, _)| k == column)
                            .map(|(_, v)| v.clone())
                            .unwrap_or_default()
                    })
                    .collect();
                Record::new(geometry, attributes)
            })
            .collect();
        (columns, records)
    }
}

/// Render a JSON property value as the string stored in a record
pub fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligner_fills_missing_keys() {
        let mut aligner = ColumnAligner::new();
        aligner.push(
            Some(Geometry::point(0.0, 0.0)),
            vec![("name".into(), "a".into())],
        );
        aligner.push(
            Some(Geometry::point(1.0, 1.0)),
            vec![("kind".into(), "x".into()), ("name".into(), "b".into())],
        );

        let (columns, records) = aligner.finish();
        assert_eq!(columns, vec!["name", "kind"]);
        assert_eq!(records[0].attributes, vec!["a", ""]);
        assert_eq!(records[1].attributes, vec!["b", "x"]);
    }

    #[test]
    fn test_feature_collection_has_no_crs_member() {
        let dataset = FeatureDataset::new(
            vec!["name".into()],
            vec![Record::new(Some(Geometry::point(10.0, 20.0)), vec!["p".into()])],
        );
        let json = serde_json::to_value(dataset.to_feature_collection()).unwrap();
        assert!(json.get("crs").is_none());
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0], 10.0);
        assert_eq!(json["features"][0]["properties"]["name"], "p");
    }

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(&serde_json::json!(null)), "");
        assert_eq!(stringify_value(&serde_json::json!(3)), "3");
        assert_eq!(stringify_value(&serde_json::json!("x")), "x");
        assert_eq!(stringify_value(&serde_json::json!([1, 2])), "[1,2]");
    }
}
