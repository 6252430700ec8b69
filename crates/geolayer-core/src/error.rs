//! Error types for GeoLayer

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeolayerError {
    // Dispatch errors
    #[error("Unsupported format: .{extension} (supported: {})", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("Failed to read {format} data after {} attempt(s): {cause}", attempts.len().max(1))]
    GeoReadError {
        format: String,
        attempts: Vec<String>,
        cause: String,
    },

    // Single loader strategy failure, retried locally by loader chains
    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    // Normalization errors
    #[error("No valid geometry: {reason}")]
    EmptyOrNoGeometry { reason: String },

    #[error("Reprojection from {source_crs} to EPSG:4326 failed: {reason}")]
    ReprojectionError { source_crs: String, reason: String },

    // Archive errors
    #[error("No .{target} file inside archive {}", archive.display())]
    NoEmbeddedFile { archive: PathBuf, target: String },

    // Tabular errors
    #[error("Table read error: {reason}")]
    TableReadError { reason: String },

    #[error("Table not found for handle {handle}")]
    TableNotFound { handle: String },

    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    // Store errors
    #[error("Layer not found: {name}")]
    LayerNotFound { name: String },

    #[error("Invalid layer name '{name}': {reason}")]
    BadLayerName { name: String, reason: String },

    #[error("Invalid bounding box: {reason}")]
    BadBBox { reason: String },

    #[error("Layer store error: {reason}")]
    StoreIOError { reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // File errors
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stable machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    GeoReadError,
    EmptyOrNoGeometry,
    ReprojectionError,
    NoEmbeddedFile,
    TableReadError,
    TableNotFound,
    ColumnNotFound,
    LayerNotFound,
    BadLayerName,
    BadBbox,
    StoreIoError,
    ConfigInvalid,
    Internal,
}

impl GeolayerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeolayerError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            GeolayerError::GeoReadError { .. } | GeolayerError::FormatError { .. } => {
                ErrorKind::GeoReadError
            }
            GeolayerError::EmptyOrNoGeometry { .. } => ErrorKind::EmptyOrNoGeometry,
            GeolayerError::ReprojectionError { .. } => ErrorKind::ReprojectionError,
            GeolayerError::NoEmbeddedFile { .. } => ErrorKind::NoEmbeddedFile,
            GeolayerError::TableReadError { .. } => ErrorKind::TableReadError,
            GeolayerError::TableNotFound { .. } => ErrorKind::TableNotFound,
            GeolayerError::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            GeolayerError::LayerNotFound { .. } => ErrorKind::LayerNotFound,
            GeolayerError::BadLayerName { .. } => ErrorKind::BadLayerName,
            GeolayerError::BadBBox { .. } => ErrorKind::BadBbox,
            GeolayerError::StoreIOError { .. } => ErrorKind::StoreIoError,
            GeolayerError::ConfigInvalid { .. } => ErrorKind::ConfigInvalid,
            GeolayerError::FileNotFound { .. }
            | GeolayerError::Io(_)
            | GeolayerError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure was caused by the uploaded data or the request
    /// rather than by the service itself.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::StoreIoError | ErrorKind::ConfigInvalid | ErrorKind::Internal
        )
    }

    pub fn format_error(format: &str, message: impl Into<String>) -> Self {
        GeolayerError::FormatError {
            format: format.to_string(),
            message: message.into(),
        }
    }

    pub fn store_io(reason: impl std::fmt::Display) -> Self {
        GeolayerError::StoreIOError {
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeolayerError>;
