//! Table command implementation

use crate::cli::TableArgs;
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use geolayer_core::config::LayeredConfig;
use geolayer_ingest::{Ingestor, TableIngestResult};
use geolayer_store::MemoryLayerStore;
use serde::Serialize;

use super::source_name;

#[derive(Serialize)]
struct TableOutput<'a> {
    table: &'a TableIngestResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    geojson: Option<geojson::FeatureCollection>,
}

pub async fn execute(args: TableArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    if !args.path.is_file() {
        bail!("File not found: {}", args.path.display());
    }
    let name = source_name(&args.path, None)?;

    // Tables never reach the layer store
    let mut ingestor = Ingestor::from_config(MemoryLayerStore::new(), config);
    if let Some(rows) = args.rows {
        ingestor = ingestor.with_preview_rows(rows);
    }

    let result = ingestor
        .ingest_tabular(&args.path, &name)
        .await
        .with_context(|| format!("Failed to read table {}", args.path.display()))?;

    let geojson = match (&args.lat, &args.lon) {
        (Some(lat), Some(lon)) => Some(ingestor.plot_table(&result.handle, lat, lon)?),
        _ => None,
    };

    if output.is_json() {
        return output.result(TableOutput { table: &result, geojson });
    }

    print_preview(&result, output);
    if let Some(collection) = geojson {
        let skipped = result.table.len() - collection.features.len();
        output.success(format!("Plotted {} point(s)", collection.features.len()));
        if skipped > 0 {
            output.warning(format!("Skipped {} row(s) without numeric coordinates", skipped));
        }
        output.data(&collection)?;
    }
    Ok(())
}

/// Human-readable preview of an ingested table
pub fn print_preview(result: &TableIngestResult, output: &OutputWriter) {
    let table = &result.table;
    output.section(format!("{} ({} rows)", table.source_name, table.len()));

    let rows: Vec<Vec<String>> = table.rows.iter().take(result.preview_rows).cloned().collect();
    output.grid(&table.columns, &rows);

    if table.skipped_rows > 0 {
        output.warning(format!("Skipped {} malformed row(s)", table.skipped_rows));
    }
}
