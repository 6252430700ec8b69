use geolayer_core::models::{LayerMeta, Marker, TableHandle, TableRecord, TableRecordSet};
use geolayer_geo::NormalizeReport;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

/// Result of ingesting a geospatial file
#[derive(Debug, Clone, serde::Serialize)]
pub struct GeoIngestResult {
    pub layer: String,
    pub collection: geojson::FeatureCollection,
    pub markers: Vec<Marker>,
    pub meta: LayerMeta,
    pub report: NormalizeReport,
}

/// Result of ingesting a tabular file
#[derive(Debug, Clone)]
pub struct TableIngestResult {
    pub handle: TableHandle,
    pub table: Arc<TableRecordSet>,
    pub preview_rows: usize,
}

impl TableIngestResult {
    pub fn columns(&self) -> &[String] {
        &self.table.columns
    }

    pub fn preview(&self) -> Vec<TableRecord<'_>> {
        self.table.preview(self.preview_rows)
    }
}

impl Serialize for TableIngestResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TableIngestResult", 6)?;
        state.serialize_field("handle", &self.handle)?;
        state.serialize_field("source_name", &self.table.source_name)?;
        state.serialize_field("columns", &self.table.columns)?;
        state.serialize_field("preview", &self.preview())?;
        state.serialize_field("row_count", &self.table.len())?;
        state.serialize_field("skipped_rows", &self.table.skipped_rows)?;
        state.end()
    }
}

/// Outcome of `Ingestor::ingest`, by source family
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestOutcome {
    Geospatial(GeoIngestResult),
    Tabular(TableIngestResult),
}
