use std::path::Path;
use std::sync::Arc;

use axum::{extract::Multipart, extract::State, Json};
use geolayer_core::GeolayerError;
use geolayer_ingest::IngestOutcome;

use crate::dto::UploadResponse;
use crate::error::ApiError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "data_file";

pub async fn handle_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let (filename, data) = extract_file(&mut multipart).await?;
    let filename = sanitize_filename(&filename)
        .ok_or_else(|| ApiError::bad_request("Invalid file name"))?;

    tracing::info!(filename = %filename, size = data.len(), "Received upload");

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(GeolayerError::from)?;
    let saved = state.upload_dir.join(&filename);
    tokio::fs::write(&saved, &data).await.map_err(GeolayerError::from)?;

    let response = match state.ingestor.ingest(&saved, &filename).await? {
        IngestOutcome::Tabular(table) => UploadResponse::Table { table },
        IngestOutcome::Geospatial(result) => {
            let added = result.markers.len();
            state.markers.write().await.extend(result.markers);
            UploadResponse::Map {
                layer: result.layer,
                geojson: result.collection,
                markers_added: added,
            }
        }
    };

    Ok(Json(response))
}

async fn extract_file(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("Failed to parse multipart form").with_details(e.to_string())
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("No file selected"));
        }
        let data = field.bytes().await.map_err(|e| {
            ApiError::bad_request("Failed to read file data").with_details(e.to_string())
        })?;
        return Ok((filename, data.to_vec()));
    }

    Err(ApiError::bad_request("No file part")
        .with_details(format!("Expected a '{}' field in the multipart form", UPLOAD_FIELD)))
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_filename(name: &str) -> Option<String> {
    // Browsers on Windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() || Path::new(&cleaned).file_stem().is_none() {
        None
    } else {
        Some(cleaned)
    }
}
