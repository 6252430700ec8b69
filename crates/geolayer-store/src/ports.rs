use async_trait::async_trait;
use chrono::Utc;
use geolayer_core::error::Result;
use geolayer_core::models::{BoundingBox, FeatureDataset, LayerMeta};
use geolayer_geo::spatial::dataset_extent;
use std::sync::Arc;

/// Port for multi-layer feature storage
#[async_trait]
pub trait LayerStore: Send + Sync {
    /// Persist `dataset` as layer `name`, replacing any previous content
    async fn write_layer(&self, name: &str, dataset: &FeatureDataset) -> Result<LayerMeta>;

    /// Records of layer `name` whose geometry intersects `bbox`
    async fn read_layer(&self, name: &str, bbox: &BoundingBox) -> Result<FeatureDataset>;

    /// Metadata of every stored layer, ordered by name
    async fn list_layers(&self) -> Result<Vec<LayerMeta>>;

    async fn has_layer(&self, name: &str) -> Result<bool>;

    /// Check that the backing storage still answers
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T> LayerStore for Arc<T>
where
    T: LayerStore + ?Sized,
{
    async fn write_layer(&self, name: &str, dataset: &FeatureDataset) -> Result<LayerMeta> {
        (**self).write_layer(name, dataset).await
    }

    async fn read_layer(&self, name: &str, bbox: &BoundingBox) -> Result<FeatureDataset> {
        (**self).read_layer(name, bbox).await
    }

    async fn list_layers(&self) -> Result<Vec<LayerMeta>> {
        (**self).list_layers().await
    }

    async fn has_layer(&self, name: &str) -> Result<bool> {
        (**self).has_layer(name).await
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}

/// Metadata describing `dataset` stored under `name` right now
pub fn describe_layer(name: &str, dataset: &FeatureDataset) -> LayerMeta {
    LayerMeta {
        name: name.to_string(),
        feature_count: dataset.len(),
        columns: dataset.columns.clone(),
        bbox: dataset_extent(dataset),
        updated_at: Utc::now(),
    }
}
