//! In-memory layer store for development and testing.

use async_trait::async_trait;
use geolayer_core::error::{GeolayerError, Result};
use geolayer_core::models::{validate_layer_name, BoundingBox, FeatureDataset, LayerMeta};
use geolayer_geo::SpatialIndex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{describe_layer, LayerStore};

struct StoredLayer {
    meta: LayerMeta,
    dataset: FeatureDataset,
    index: SpatialIndex,
}

/// In-memory implementation of LayerStore
///
/// A write swaps the whole layer under the write lock, so readers see the
/// old or the new layer, never a mix.
#[derive(Clone, Default)]
pub struct MemoryLayerStore {
    layers: Arc<RwLock<HashMap<String, Arc<StoredLayer>>>>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryLayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLayerStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl LayerStore for MemoryLayerStore {
    async fn write_layer(&self, name: &str, dataset: &FeatureDataset) -> Result<LayerMeta> {
        validate_layer_name(name)?;

        let stored = Arc::new(StoredLayer {
            meta: describe_layer(name, dataset),
            dataset: dataset.clone(),
            index: SpatialIndex::build(dataset),
        });
        let meta = stored.meta.clone();

        self.layers.write().await.insert(name.to_string(), stored);
        Ok(meta)
    }

    async fn read_layer(&self, name: &str, bbox: &BoundingBox) -> Result<FeatureDataset> {
        let layer = self
            .layers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| GeolayerError::LayerNotFound { name: name.to_string() })?;

        Ok(layer.index.query(&layer.dataset, bbox))
    }

    async fn list_layers(&self) -> Result<Vec<LayerMeta>> {
        let layers = self.layers.read().await;
        let mut metas: Vec<LayerMeta> = layers.values().map(|l| l.meta.clone()).collect();
        metas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metas)
    }

    async fn has_layer(&self, name: &str) -> Result<bool> {
        Ok(self.layers.read().await.contains_key(name))
    }
}
