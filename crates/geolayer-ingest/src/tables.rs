//! Parsed tables kept between upload and point conversion
//!
//! Each ingested table is stored under its own `TableHandle`; callers pass the
//! handle back when converting the table to points.

use geolayer_core::error::{GeolayerError, Result};
use geolayer_core::models::{TableHandle, TableRecordSet};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of parsed tables keyed by handle
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Arc<RwLock<HashMap<TableHandle, Arc<TableRecordSet>>>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: TableRecordSet) -> (TableHandle, Arc<TableRecordSet>) {
        let handle = TableHandle::new();
        let table = Arc::new(table);
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(handle, Arc::clone(&table));
        (handle, table)
    }

    pub fn get(&self, handle: &TableHandle) -> Result<Arc<TableRecordSet>> {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(handle)
            .cloned()
            .ok_or_else(|| GeolayerError::TableNotFound {
                handle: handle.to_string(),
            })
    }

    pub fn remove(&self, handle: &TableHandle) -> Option<Arc<TableRecordSet>> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(handle)
    }

    /// Drop every table, returning how many were held
    pub fn clear(&self) -> usize {
        let mut tables = self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = tables.len();
        tables.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Convert a table to point features using two coordinate columns
///
/// Rows whose coordinates do not parse are skipped. The remaining columns
/// become string properties.
pub fn plot_points(
    table: &TableRecordSet,
    lat_col: &str,
    lon_col: &str,
) -> Result<geojson::FeatureCollection> {
    let column = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| GeolayerError::ColumnNotFound { column: name.to_string() })
    };
    let lat_idx = column(lat_col)?;
    let lon_idx = column(lon_col)?;

    let mut skipped = 0;
    let mut features = Vec::with_capacity(table.len());

    for row in &table.rows {
        let coords = row
            .get(lat_idx)
            .and_then(|v| parse_coordinate(v))
            .zip(row.get(lon_idx).and_then(|v| parse_coordinate(v)));
        let Some((lat, lon)) = coords else {
            skipped += 1;
            continue;
        };

        let properties: serde_json::Map<String, serde_json::Value> = table
            .columns
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(i, _)| *i != lat_idx && *i != lon_idx)
            .map(|(_, (c, v))| (c.clone(), serde_json::Value::String(v.clone())))
            .collect();

        features.push(geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    tracing::info!(
        table = %table.source_name,
        points = features.len(),
        skipped,
        "Converted table to points"
    );

    Ok(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geolayer_core::ErrorKind;

    fn table() -> TableRecordSet {
        TableRecordSet {
            source_name: "stations".into(),
            columns: vec!["name".into(), "lat".into(), "lon".into()],
            rows: vec![
                vec!["A".into(), "-8.5".into(), "115.2".into()],
                vec!["B".into(), "n/a".into(), "110.0".into()],
                vec!["C".into(), " -6.2 ".into(), "106.8".into()],
            ],
            skipped_rows: 0,
        }
    }

    #[test]
    fn test_plot_points_skips_unparseable_rows() {
        let collection = plot_points(&table(), "lat", "lon").unwrap();
        assert_eq!(collection.features.len(), 2);

        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0], 115.2);
        assert_eq!(json["features"][0]["geometry"]["coordinates"][1], -8.5);
        assert_eq!(json["features"][1]["properties"]["name"], "C");
        assert!(json["features"][0]["properties"].get("lat").is_none());
    }

    #[test]
    fn test_plot_points_unknown_column() {
        let err = plot_points(&table(), "latitude", "lon").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnNotFound);
    }

    #[test]
    fn test_registry_handles() {
        let registry = TableRegistry::new();
        let (handle, _) = registry.insert(table());
        assert_eq!(registry.get(&handle).unwrap().len(), 3);

        let unknown = TableHandle::new();
        assert_eq!(registry.get(&unknown).unwrap_err().kind(), ErrorKind::TableNotFound);

        registry.insert(table());
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.clear(), 0);
    }
}
