use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Ingestion
        .route("/api/upload", post(handlers::handle_upload))
        .route("/api/plot_table", post(handlers::plot_table))

        // Queries
        .route("/api/layers", get(handlers::list_layers))
        .route("/api/layer/{layer}", get(handlers::get_layer))
        .route("/api/markers", get(handlers::list_markers))

        // Session
        .route("/reset", get(handlers::reset_session).post(handlers::reset_session))

        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
