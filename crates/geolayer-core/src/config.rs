use crate::error::{GeolayerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoLayer
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Layer store container file
    pub store_path: ConfigValue<PathBuf>,
    /// Where uploaded files are saved before ingestion
    pub upload_dir: ConfigValue<PathBuf>,
    /// Root under which per-call archive scratch directories are created
    pub scratch_dir: ConfigValue<PathBuf>,
    /// Number of rows returned in tabular previews
    pub preview_rows: ConfigValue<usize>,
    pub port: ConfigValue<u16>,
    pub cors_origin: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            store_path: ConfigValue::new(
                PathBuf::from("uploads").join("uploads.gpkg"),
                ConfigSource::Default,
            ),
            upload_dir: ConfigValue::new(PathBuf::from("uploads"), ConfigSource::Default),
            scratch_dir: ConfigValue::new(env::temp_dir(), ConfigSource::Default),
            preview_rows: ConfigValue::new(5, ConfigSource::Default),
            port: ConfigValue::new(5000, ConfigSource::Default),
            cors_origin: ConfigValue::new(
                "http://localhost:3000".to_string(),
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeolayerError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeolayerError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(store_path) = file_config.store_path {
            self.store_path.update(store_path, ConfigSource::File);
        }

        if let Some(upload_dir) = file_config.upload_dir {
            self.upload_dir.update(upload_dir, ConfigSource::File);
        }

        if let Some(scratch_dir) = file_config.scratch_dir {
            self.scratch_dir.update(scratch_dir, ConfigSource::File);
        }

        if let Some(preview_rows) = file_config.preview_rows {
            self.preview_rows.update(preview_rows, ConfigSource::File);
        }

        if let Some(port) = file_config.port {
            self.port.update(port, ConfigSource::File);
        }

        if let Some(cors_origin) = file_config.cors_origin {
            self.cors_origin.update(cors_origin, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOLAYER_STORE_PATH
        if let Ok(path) = env::var("GEOLAYER_STORE_PATH") {
            if path.trim().is_empty() {
                tracing::warn!("Ignoring empty GEOLAYER_STORE_PATH");
            } else {
                self.store_path.update(PathBuf::from(path), ConfigSource::Environment);
            }
        }

        // GEOLAYER_UPLOAD_DIR
        if let Ok(dir) = env::var("GEOLAYER_UPLOAD_DIR") {
            if dir.trim().is_empty() {
                tracing::warn!("Ignoring empty GEOLAYER_UPLOAD_DIR");
            } else {
                self.upload_dir.update(PathBuf::from(dir), ConfigSource::Environment);
            }
        }

        // GEOLAYER_SCRATCH_DIR
        if let Ok(dir) = env::var("GEOLAYER_SCRATCH_DIR") {
            if dir.trim().is_empty() {
                tracing::warn!("Ignoring empty GEOLAYER_SCRATCH_DIR");
            } else {
                self.scratch_dir.update(PathBuf::from(dir), ConfigSource::Environment);
            }
        }

        // GEOLAYER_PREVIEW_ROWS
        if let Ok(rows_str) = env::var("GEOLAYER_PREVIEW_ROWS") {
            match parse_preview_rows(&rows_str) {
                Ok(rows) => self.preview_rows.update(rows, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOLAYER_PREVIEW_ROWS value '{}': expected a positive integer",
                    rows_str
                ),
            }
        }

        // GEOLAYER_PORT
        if let Ok(port_str) = env::var("GEOLAYER_PORT") {
            match port_str.parse::<u16>() {
                Ok(port) => self.port.update(port, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOLAYER_PORT value '{}': expected a port number",
                    port_str
                ),
            }
        }

        // GEOLAYER_CORS_ORIGIN
        if let Ok(origin) = env::var("GEOLAYER_CORS_ORIGIN") {
            self.cors_origin.update(origin, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(store_path) = overrides.store_path {
            self.store_path.update(store_path, ConfigSource::Cli);
        }

        if let Some(upload_dir) = overrides.upload_dir {
            self.upload_dir.update(upload_dir, ConfigSource::Cli);
        }

        if let Some(scratch_dir) = overrides.scratch_dir {
            self.scratch_dir.update(scratch_dir, ConfigSource::Cli);
        }

        if let Some(preview_rows) = overrides.preview_rows {
            self.preview_rows.update(preview_rows, ConfigSource::Cli);
        }

        if let Some(port) = overrides.port {
            self.port.update(port, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "store_path".to_string(),
            (self.store_path.value.display().to_string(), self.store_path.source),
        );

        map.insert(
            "upload_dir".to_string(),
            (self.upload_dir.value.display().to_string(), self.upload_dir.source),
        );

        map.insert(
            "scratch_dir".to_string(),
            (self.scratch_dir.value.display().to_string(), self.scratch_dir.source),
        );

        map.insert(
            "preview_rows".to_string(),
            (self.preview_rows.value.to_string(), self.preview_rows.source),
        );

        map.insert("port".to_string(), (self.port.value.to_string(), self.port.source));

        map.insert(
            "cors_origin".to_string(),
            (self.cors_origin.value.clone(), self.cors_origin.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    store_path: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    scratch_dir: Option<PathBuf>,
    preview_rows: Option<usize>,
    port: Option<u16>,
    cors_origin: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub store_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    pub preview_rows: Option<usize>,
    pub port: Option<u16>,
}

/// Parse a preview row count (must be at least 1)
pub fn parse_preview_rows(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(GeolayerError::ConfigInvalid {
            key: "preview_rows".to_string(),
            reason: format!("Invalid preview row count: {}. Use a positive integer", s),
        }),
    }
}
