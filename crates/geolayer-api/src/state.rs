use geolayer_core::models::Marker;
use geolayer_ingest::Ingestor;
use geolayer_store::LayerStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AppState {
    pub ingestor: Ingestor<Arc<dyn LayerStore>>,
    /// Markers from every geospatial upload since the last reset
    pub markers: RwLock<Vec<Marker>>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(ingestor: Ingestor<Arc<dyn LayerStore>>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            ingestor,
            markers: RwLock::new(Vec::new()),
            upload_dir: upload_dir.into(),
        }
    }
}
