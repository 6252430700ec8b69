//! File-backed multi-layer store
//!
//! All layers live in one SQLite file. Each write replaces a layer inside a
//! single transaction, so readers only ever observe a complete layer.

pub mod layers;
pub mod migrations;

pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use geolayer_core::error::{GeolayerError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Multi-layer store held in a single SQLite container file
#[derive(Debug, Clone)]
pub struct GpkgStore {
    pool: SqlitePool,
    path: PathBuf,
    // Serialises writers sharing this handle
    write_lock: Arc<Mutex<()>>,
}

impl GpkgStore {
    /// Open (or create) the store file and apply pending migrations
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                GeolayerError::store_io(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| {
                GeolayerError::store_io(format!("Failed to open store {}: {}", path.display(), e))
            })?;

        MigrationManager::new(pool.clone())
            .run_migrations()
            .await
            .map_err(|e| GeolayerError::store_io(format!("Migration failed: {}", e)))?;

        tracing::info!(path = %path.display(), "Opened layer store");

        Ok(Self {
            pool,
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
