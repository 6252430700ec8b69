use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::ResetResponse;
use crate::state::AppState;

/// Forget accumulated markers and uploaded tables; stored layers are kept
pub async fn reset_session(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    let markers_cleared = {
        let mut markers = state.markers.write().await;
        let count = markers.len();
        markers.clear();
        count
    };
    let tables_cleared = state.ingestor.tables().clear();

    tracing::info!(markers_cleared, tables_cleared, "Reset session");
    Json(ResetResponse { markers_cleared, tables_cleared })
}
