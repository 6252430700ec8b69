//! Slice command implementation

use crate::cli::SliceArgs;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geolayer_core::config::LayeredConfig;
use geolayer_core::models::BoundingBox;

use super::open_ingestor;

pub async fn execute(args: SliceArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let bbox = match &args.bbox {
        Some(raw) => BoundingBox::parse_csv(raw)?,
        None => BoundingBox::world(),
    };

    let ingestor = open_ingestor(config).await?;
    let collection = ingestor.layer_slice(&args.layer, &bbox).await?;

    match &args.output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&collection)?;
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output.success(format!(
                "Wrote {} feature(s) to {}",
                collection.features.len(),
                path.display()
            ));
            Ok(())
        }
        None if output.is_json() => output.result(&collection),
        None => output.data(&collection),
    }
}
