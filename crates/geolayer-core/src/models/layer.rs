use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use crate::error::{GeolayerError, Result};

/// Summary of a persisted layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMeta {
    pub name: String,
    pub feature_count: usize,
    pub columns: Vec<String>,
    /// Extent of all stored geometries, `None` for an empty layer
    pub bbox: Option<BoundingBox>,
    pub updated_at: DateTime<Utc>,
}

/// Validate a layer name before it reaches a store
pub fn validate_layer_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GeolayerError::BadLayerName {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    if name.chars().any(char::is_control) {
        return Err(GeolayerError::BadLayerName {
            name: name.escape_default().to_string(),
            reason: "name must not contain control characters".to_string(),
        });
    }
    Ok(())
}
