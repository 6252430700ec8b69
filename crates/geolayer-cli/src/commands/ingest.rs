//! Ingest command implementation

use crate::cli::IngestArgs;
use crate::output::OutputWriter;
use crate::output_types::IngestLayerOutput;
use crate::progress::create_spinner;
use anyhow::{bail, Context, Result};
use geolayer_core::config::LayeredConfig;
use geolayer_ingest::{GeoIngestResult, IngestOutcome};

use super::table::print_preview;
use super::{open_ingestor, source_name};

pub async fn execute(args: IngestArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    if !args.path.is_file() {
        bail!("File not found: {}", args.path.display());
    }
    let name = source_name(&args.path, args.name)?;

    let ingestor = open_ingestor(config).await?;

    let spinner = create_spinner(&format!("Ingesting {}...", name), output.is_json());
    let outcome = ingestor.ingest(&args.path, &name).await;
    spinner.finish_and_clear();
    let outcome = outcome.with_context(|| format!("Failed to ingest {}", args.path.display()))?;

    match outcome {
        IngestOutcome::Geospatial(result) => print_layer(&result, output),
        IngestOutcome::Tabular(result) => {
            if output.is_json() {
                return output.result(&result);
            }
            print_preview(&result, output);
            output.info(format!(
                "Tables are not stored as layers; run 'geolayer table {} --lat <COL> --lon <COL>' to plot it",
                args.path.display()
            ));
            Ok(())
        }
    }
}

fn print_layer(result: &GeoIngestResult, output: &OutputWriter) -> Result<()> {
    let report = &result.report;

    if output.is_json() {
        return output.result(IngestLayerOutput {
            layer: result.layer.clone(),
            feature_count: result.meta.feature_count,
            marker_count: result.markers.len(),
            bbox: result.meta.bbox,
            dropped_null: report.dropped_null,
            dropped_empty: report.dropped_empty,
            exploded: report.exploded,
            reprojected_from: report.reprojected_from.clone(),
            crs_assumed: report.crs_assumed,
        });
    }

    output.success(format!("Stored layer '{}'", result.layer));
    output.kv("Features", result.meta.feature_count);
    output.kv("Markers", result.markers.len());
    if let Some(bbox) = result.meta.bbox {
        output.kv(
            "Extent",
            format!("{:.5}, {:.5}, {:.5}, {:.5}", bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y),
        );
    }
    match (&report.reprojected_from, report.crs_assumed) {
        (Some(source), _) => output.kv("Reprojected", format!("{} -> EPSG:4326", source)),
        (None, true) => output.warning("No CRS declared; coordinates assumed to be WGS84"),
        (None, false) => {}
    }
    if report.exploded > 0 {
        output.kv("Multipart split", report.exploded);
    }
    if report.dropped_null > 0 {
        output.warning(format!("Dropped {} record(s) without geometry", report.dropped_null));
    }
    if report.dropped_empty > 0 {
        output.warning(format!("Dropped {} empty multipart record(s)", report.dropped_empty));
    }
    Ok(())
}
