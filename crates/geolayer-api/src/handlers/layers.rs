use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use geolayer_core::models::{BoundingBox, LayerMeta};

use crate::error::ApiError;
use crate::state::AppState;

/// Features of one layer intersecting the `minx,miny,maxx,maxy` query box
pub async fn get_layer(
    State(state): State<Arc<AppState>>,
    Path(layer): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<geojson::FeatureCollection>, ApiError> {
    let bbox = BoundingBox::from_query(&params)?;
    let collection = state.ingestor.layer_slice(&layer, &bbox).await?;
    Ok(Json(collection))
}

pub async fn list_layers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LayerMeta>>, ApiError> {
    Ok(Json(state.ingestor.list_layers().await?))
}
