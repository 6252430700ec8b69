use std::env;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use geolayer_core::config::LayeredConfig;
use geolayer_ingest::Ingestor;
use geolayer_store::{GpkgStore, LayerStore};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geolayer_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geolayer_api=info,geolayer_ingest=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut layered = LayeredConfig::with_defaults();
    if let Ok(path) = env::var("GEOLAYER_CONFIG") {
        layered = layered
            .load_from_file(&path)
            .with_context(|| format!("Failed to load config file {}", path))?;
    }
    let layered = layered.load_from_env();
    let config = ApiConfig::from_layered(&layered);

    tracing::info!(
        port = config.port,
        store = %config.store_path.display(),
        uploads = %config.upload_dir.display(),
        "Starting GeoLayer API server"
    );

    let store = GpkgStore::open(&config.store_path).await.with_context(|| {
        format!("Failed to open layer store at {}", config.store_path.display())
    })?;
    let store: Arc<dyn LayerStore> = Arc::new(store);

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let ingestor = Ingestor::new(store, config.scratch_dir.clone())
        .with_preview_rows(config.preview_rows);
    let state = Arc::new(AppState::new(ingestor, config.upload_dir.clone()));

    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
