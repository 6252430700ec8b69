use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GeoLayer - Ingest geospatial and tabular files into a layer store
#[derive(Parser, Debug)]
#[command(name = "geolayer")]
#[command(about = "Ingest geospatial and tabular files into a layer store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML); defaults to ./geolayer.toml when present
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Layer store file
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Directory for temporary archive extraction
    #[arg(long, global = true, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a file (geospatial files become layers, tables are previewed)
    Ingest(IngestArgs),

    /// Print the features of a layer intersecting a bounding box
    Slice(SliceArgs),

    /// List stored layers
    Layers,

    /// Preview a tabular file and optionally plot two columns as points
    Table(TableArgs),

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Path to the file (GeoJSON, Shapefile, KML, KMZ, CSV, Excel, ODS)
    pub path: PathBuf,

    /// File name used to derive the layer name (defaults to the path's name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SliceArgs {
    /// Layer name
    pub layer: String,

    /// Bounding box as minx,miny,maxx,maxy (defaults to the whole world)
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Write the FeatureCollection to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct TableArgs {
    /// Path to the tabular file
    pub path: PathBuf,

    /// Latitude column to plot
    #[arg(long, requires = "lon")]
    pub lat: Option<String>,

    /// Longitude column to plot
    #[arg(long, requires = "lat")]
    pub lon: Option<String>,

    /// Number of rows to preview
    #[arg(long)]
    pub rows: Option<usize>,
}
