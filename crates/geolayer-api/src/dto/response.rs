use geolayer_ingest::TableIngestResult;
use serde::Serialize;

/// Upload response, tagged by what the upload turned into
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadResponse {
    Table {
        #[serde(flatten)]
        table: TableIngestResult,
    },
    Map {
        layer: String,
        geojson: geojson::FeatureCollection,
        markers_added: usize,
    },
}

/// Point conversion response
#[derive(Debug, Serialize)]
pub struct MapResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geojson: geojson::FeatureCollection,
}

impl MapResponse {
    pub fn new(geojson: geojson::FeatureCollection) -> Self {
        Self { kind: "map", geojson }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "geolayer-api" }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub markers_cleared: usize,
    pub tables_cleared: usize,
}
