//! Layers command implementation

use crate::output::OutputWriter;
use crate::output_types::LayersOutput;
use anyhow::Result;
use geolayer_core::config::LayeredConfig;
use tabled::Tabled;

use super::open_ingestor;

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Features")]
    feature_count: usize,
    #[tabled(rename = "Columns")]
    columns: String,
    #[tabled(rename = "Extent")]
    extent: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

pub async fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let ingestor = open_ingestor(config).await?;
    let layers = ingestor.list_layers().await?;

    if output.is_json() {
        return output.result(LayersOutput { layers });
    }

    if layers.is_empty() {
        output.info("No layers stored yet");
        return Ok(());
    }

    output.section("Stored Layers");
    let rows = layers
        .into_iter()
        .map(|meta| LayerRow {
            feature_count: meta.feature_count,
            columns: meta.columns.join(", "),
            extent: meta
                .bbox
                .map(|b| format!("{:.3}, {:.3}, {:.3}, {:.3}", b.min_x, b.min_y, b.max_x, b.max_y))
                .unwrap_or_else(|| "-".to_string()),
            updated: meta.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            name: meta.name,
        })
        .collect();
    output.table(rows);
    Ok(())
}
