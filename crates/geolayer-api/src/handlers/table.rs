use std::sync::Arc;

use axum::{extract::State, Json};
use geolayer_core::models::TableHandle;

use crate::dto::{MapResponse, PlotTableRequest};
use crate::error::ApiError;
use crate::state::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Turn two columns of an uploaded table into point features
pub async fn plot_table(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlotTableRequest>,
) -> Result<Json<MapResponse>, ApiError> {
    let (Some(lat_col), Some(lon_col)) = (non_empty(request.lat_col), non_empty(request.lon_col))
    else {
        return Err(ApiError::bad_request("Select lat/lon"));
    };

    let raw_handle = request.handle.unwrap_or_default();
    let handle = TableHandle::parse(&raw_handle).ok_or_else(|| {
        ApiError::bad_request("Invalid table handle").with_details(raw_handle.clone())
    })?;

    let geojson = state.ingestor.plot_table(&handle, &lat_col, &lon_col)?;
    tracing::info!(handle = %handle, points = geojson.features.len(), "Plotted table");

    Ok(Json(MapResponse::new(geojson)))
}
