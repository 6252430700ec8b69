//! Format abstraction layer for multi-format ingestion
//!
//! Every geospatial reader implements the `LoadStrategy` trait. Readers are
//! grouped into ordered `LoaderChain`s; a chain keeps the first strategy that
//! yields a non-empty dataset and reports every failed attempt otherwise.
//! `FormatDispatcher` maps a file extension to the chain (or to the tabular
//! loader) that handles it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{GeolayerError, Result};
use crate::models::RawDataset;

pub mod archive;
pub mod generic;
pub mod geojson;
pub mod kml;
pub mod kml_stream;
pub mod shapefile;
pub mod tabular;
pub mod validation;

pub use archive::{ArchiveExtractor, ExtractedFile};
pub use generic::GenericReader;
pub use geojson::GeoJsonReader;
pub use kml::KmlDriver;
pub use kml_stream::KmlStreamReader;
pub use shapefile::ShapefileReader;
pub use tabular::TabularLoader;

/// Extensions routed to the tabular loader
pub const TABULAR_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx", "xlsm", "ods"];

/// Extensions routed to a geospatial loader chain
pub const GEOSPATIAL_EXTENSIONS: &[&str] = &["geojson", "json", "kml", "kmz", "shp"];

/// Broad family a source file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Tabular,
    Geospatial,
}

/// Lower-cased extension of a path, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// All extensions accepted by the dispatcher
pub fn supported_extensions() -> Vec<String> {
    TABULAR_EXTENSIONS
        .iter()
        .chain(GEOSPATIAL_EXTENSIONS)
        .map(|s| s.to_string())
        .collect()
}

/// Decide whether a file is tabular or geospatial from its extension
pub fn classify(path: &Path) -> Result<SourceKind> {
    let extension = extension_of(path).ok_or_else(|| GeolayerError::UnsupportedFormat {
        extension: "none".to_string(),
        supported: supported_extensions(),
    })?;

    if TABULAR_EXTENSIONS.contains(&extension.as_str()) {
        Ok(SourceKind::Tabular)
    } else if GEOSPATIAL_EXTENSIONS.contains(&extension.as_str()) {
        Ok(SourceKind::Geospatial)
    } else {
        Err(GeolayerError::UnsupportedFormat {
            extension,
            supported: supported_extensions(),
        })
    }
}

/// Dataset name for a path: the file stem
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

/// One way of loading a geospatial file
#[async_trait]
pub trait LoadStrategy: Send + Sync {
    /// Try to load a dataset from the given path
    async fn try_load(&self, path: &Path) -> Result<RawDataset>;

    /// Short strategy name used in attempt reports (e.g., "kml-driver")
    fn name(&self) -> &str;

    /// Validate file structure without a full read (optional)
    async fn validate(&self, _path: &Path) -> Result<FormatValidation> {
        Ok(FormatValidation::default())
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent reading
    pub errors: Vec<String>,

    /// Warnings that don't prevent reading but indicate potential issues
    pub warnings: Vec<String>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Ordered fallback list of strategies for one format
pub struct LoaderChain {
    format: String,
    strategies: Vec<Box<dyn LoadStrategy>>,
}

impl LoaderChain {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy; strategies are tried in insertion order
    pub fn with(mut self, strategy: Box<dyn LoadStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// The KML chain: DOM driver, streaming engine, then content sniffing
    pub fn kml() -> Self {
        Self::new("KML")
            .with(Box::new(KmlDriver))
            .with(Box::new(KmlStreamReader))
            .with(Box::new(GenericReader))
    }

    /// Single-strategy chain for GeoJSON files
    pub fn geojson() -> Self {
        Self::new("GeoJSON").with(Box::new(GeoJsonReader))
    }

    /// Single-strategy chain for Shapefiles
    pub fn shapefile() -> Self {
        Self::new("Shapefile").with(Box::new(ShapefileReader))
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order and keep the first non-empty dataset
    pub async fn load(&self, path: &Path) -> Result<RawDataset> {
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let outcome = match strategy.try_load(path).await {
                Ok(dataset) if dataset.is_empty() => Err("no features found".to_string()),
                Ok(dataset) => Ok(dataset),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(dataset) => {
                    tracing::debug!(
                        format = %self.format,
                        strategy = strategy.name(),
                        features = dataset.len(),
                        "Loader strategy succeeded"
                    );
                    return Ok(dataset);
                }
                Err(cause) => {
                    tracing::debug!(
                        format = %self.format,
                        strategy = strategy.name(),
                        %cause,
                        "Loader strategy failed"
                    );
                    attempts.push(format!("{}: {}", strategy.name(), cause));
                }
            }
        }

        let cause = attempts
            .last()
            .cloned()
            .unwrap_or_else(|| "no loader strategies configured".to_string());

        Err(GeolayerError::GeoReadError {
            format: self.format.clone(),
            attempts,
            cause,
        })
    }
}

/// Routes a geospatial file to the chain that handles its extension,
/// unpacking KMZ archives first.
pub struct FormatDispatcher {
    extractor: ArchiveExtractor,
    kml: LoaderChain,
    geojson: LoaderChain,
    shapefile: LoaderChain,
}

impl FormatDispatcher {
    /// Create a dispatcher whose archive scratch directories live under `scratch_root`
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            extractor: ArchiveExtractor::new(scratch_root),
            kml: LoaderChain::kml(),
            geojson: LoaderChain::geojson(),
            shapefile: LoaderChain::shapefile(),
        }
    }

    pub fn extractor(&self) -> &ArchiveExtractor {
        &self.extractor
    }

    /// Load a geospatial file into a raw dataset
    pub async fn load_geospatial(&self, path: &Path) -> Result<RawDataset> {
        let extension = match classify(path)? {
            SourceKind::Geospatial => extension_of(path).unwrap_or_default(),
            SourceKind::Tabular => {
                return Err(GeolayerError::UnsupportedFormat {
                    extension: extension_of(path).unwrap_or_default(),
                    supported: GEOSPATIAL_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
                })
            }
        };

        match extension.as_str() {
            "kml" => self.kml.load(path).await,
            "kmz" => {
                // The guard keeps the scratch directory alive until the load finishes
                let extracted = self.extractor.extract_first(path, "kml")?;
                let mut dataset = self.kml.load(extracted.path()).await?;
                dataset.name = dataset_name(path);
                Ok(dataset)
            }
            "shp" => self.shapefile.load(path).await,
            _ => self.geojson.load(path).await,
        }
    }
}
