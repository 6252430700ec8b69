use geolayer_core::config::LayeredConfig;
use std::path::PathBuf;

/// API server configuration resolved from the layered config
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub store_path: PathBuf,
    pub upload_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub preview_rows: usize,
}

impl ApiConfig {
    pub fn from_layered(config: &LayeredConfig) -> Self {
        Self {
            port: config.port.value,
            cors_origin: config.cors_origin.value.clone(),
            store_path: config.store_path.value.clone(),
            upload_dir: config.upload_dir.value.clone(),
            scratch_dir: config.scratch_dir.value.clone(),
            preview_rows: config.preview_rows.value,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_defaults() {
        let config = ApiConfig::from_layered(&LayeredConfig::with_defaults());
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }
}
