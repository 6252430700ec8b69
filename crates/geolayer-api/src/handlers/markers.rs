use std::sync::Arc;

use axum::{extract::State, Json};
use geolayer_core::models::markers_to_collection;

use crate::state::AppState;

pub async fn list_markers(State(state): State<Arc<AppState>>) -> Json<geojson::FeatureCollection> {
    let markers = state.markers.read().await;
    Json(markers_to_collection(&markers))
}
