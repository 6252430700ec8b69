//! Command implementations

mod config;
mod ingest;
mod layers;
mod slice;
mod table;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geolayer_core::config::{CliConfigOverrides, LayeredConfig};
use geolayer_ingest::Ingestor;
use geolayer_store::GpkgStore;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let overrides = CliConfigOverrides {
        store_path: cli.store,
        scratch_dir: cli.scratch_dir,
        ..Default::default()
    };
    let config = load_config(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Ingest(args) => ingest::execute(args, &config, &output).await,
        Commands::Slice(args) => slice::execute(args, &config, &output).await,
        Commands::Layers => layers::execute(&config, &output).await,
        Commands::Table(args) => table::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}

/// Open the configured layer store behind an ingestor
async fn open_ingestor(config: &LayeredConfig) -> Result<Ingestor<GpkgStore>> {
    let path = &config.store_path.value;
    let store = GpkgStore::open(path)
        .await
        .with_context(|| format!("Failed to open layer store at {}", path.display()))?;
    Ok(Ingestor::from_config(store, config))
}

/// File name to derive dataset names from, unless overridden
fn source_name(path: &std::path::Path, explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .with_context(|| format!("Cannot derive a name from {}", path.display()))
}
