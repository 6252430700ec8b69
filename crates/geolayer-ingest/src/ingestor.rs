use geolayer_core::config::LayeredConfig;
use geolayer_core::error::Result;
use geolayer_core::formats::{classify, dataset_name, FormatDispatcher, SourceKind, TabularLoader};
use geolayer_core::models::{validate_layer_name, BoundingBox, LayerMeta, TableHandle};
use geolayer_geo::Normalizer;
use geolayer_store::LayerStore;
use std::path::{Path, PathBuf};

use crate::markers::markers_for;
use crate::models::{GeoIngestResult, IngestOutcome, TableIngestResult};
use crate::tables::{plot_points, TableRegistry};

const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Ingestion pipeline: dispatch, load, normalize, write
///
/// Every stage runs to completion before the next starts. Nothing is written
/// to the store unless all earlier stages succeed.
pub struct Ingestor<S>
where
    S: LayerStore,
{
    store: S,
    dispatcher: FormatDispatcher,
    normalizer: Normalizer,
    tables: TableRegistry,
    preview_rows: usize,
}

impl<S> Ingestor<S>
where
    S: LayerStore,
{
    /// Create an ingestor whose archive scratch space lives under `scratch_root`
    pub fn new(store: S, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dispatcher: FormatDispatcher::new(scratch_root),
            normalizer: Normalizer::new(),
            tables: TableRegistry::new(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn from_config(store: S, config: &LayeredConfig) -> Self {
        Self::new(store, config.scratch_dir.value.clone())
            .with_preview_rows(config.preview_rows.value)
    }

    pub fn with_preview_rows(mut self, preview_rows: usize) -> Self {
        self.preview_rows = preview_rows.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// Ingest a geospatial file as the layer named after `original_filename`
    pub async fn ingest_geospatial(
        &self,
        path: &Path,
        original_filename: &str,
    ) -> Result<GeoIngestResult> {
        let layer = dataset_name(Path::new(original_filename));
        validate_layer_name(&layer)?;

        let raw = self.dispatcher.load_geospatial(path).await?;
        let format = raw.format.clone();
        let (dataset, report) = self.normalizer.normalize(raw)?;

        let meta = self.store.write_layer(&layer, &dataset).await?;
        let markers = markers_for(&layer, &dataset);

        tracing::info!(
            layer = %layer,
            format = %format,
            features = dataset.len(),
            markers = markers.len(),
            dropped_null = report.dropped_null,
            dropped_empty = report.dropped_empty,
            exploded = report.exploded,
            reprojected_from = report.reprojected_from.as_deref().unwrap_or("none"),
            "Ingested geospatial file"
        );

        Ok(GeoIngestResult {
            collection: dataset.to_feature_collection(),
            layer,
            markers,
            meta,
            report,
        })
    }

    /// Parse a tabular file and keep it under a fresh handle
    pub async fn ingest_tabular(
        &self,
        path: &Path,
        original_filename: &str,
    ) -> Result<TableIngestResult> {
        let mut table = TabularLoader::load(path)?;
        table.source_name = dataset_name(Path::new(original_filename));

        let (handle, table) = self.tables.insert(table);
        tracing::info!(
            handle = %handle,
            source = %table.source_name,
            rows = table.len(),
            "Registered table"
        );

        Ok(TableIngestResult {
            handle,
            table,
            preview_rows: self.preview_rows,
        })
    }

    /// Ingest any supported file, routed by its extension
    pub async fn ingest(&self, path: &Path, original_filename: &str) -> Result<IngestOutcome> {
        match classify(path)? {
            SourceKind::Geospatial => self
                .ingest_geospatial(path, original_filename)
                .await
                .map(IngestOutcome::Geospatial),
            SourceKind::Tabular => self
                .ingest_tabular(path, original_filename)
                .await
                .map(IngestOutcome::Tabular),
        }
    }

    /// Features of `layer` intersecting `bbox`
    pub async fn layer_slice(
        &self,
        layer: &str,
        bbox: &BoundingBox,
    ) -> Result<geojson::FeatureCollection> {
        let dataset = self.store.read_layer(layer, bbox).await?;
        tracing::info!(layer, features = dataset.len(), "Served layer slice");
        Ok(dataset.to_feature_collection())
    }

    pub async fn list_layers(&self) -> Result<Vec<LayerMeta>> {
        self.store.list_layers().await
    }

    /// Points for a previously ingested table
    pub fn plot_table(
        &self,
        handle: &TableHandle,
        lat_col: &str,
        lon_col: &str,
    ) -> Result<geojson::FeatureCollection> {
        let table = self.tables.get(handle)?;
        plot_points(&table, lat_col, lon_col)
    }
}
