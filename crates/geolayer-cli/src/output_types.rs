use geolayer_core::models::{BoundingBox, LayerMeta};
use serde::Serialize;

/// Output for ingest of a geospatial file
#[derive(Debug, Serialize)]
pub struct IngestLayerOutput {
    pub layer: String,
    pub feature_count: usize,
    pub marker_count: usize,
    pub bbox: Option<BoundingBox>,
    pub dropped_null: usize,
    pub dropped_empty: usize,
    pub exploded: usize,
    pub reprojected_from: Option<String>,
    pub crs_assumed: bool,
}

/// Output for layers command
#[derive(Debug, Serialize)]
pub struct LayersOutput {
    pub layers: Vec<LayerMeta>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}
