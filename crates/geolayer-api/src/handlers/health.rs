use axum::{extract::State, Json};
use geolayer_store::LayerStore;
use std::sync::Arc;

use crate::dto::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Liveness plus a round trip to the layer store
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    state.ingestor.store().health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Layer store health check failed");
        ApiError::internal("Layer store unavailable").with_details(e.to_string())
    })?;

    Ok(Json(HealthResponse::default()))
}
