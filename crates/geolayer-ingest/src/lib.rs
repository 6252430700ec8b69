//! GeoLayer Ingest - Ingestion pipeline and query boundaries
//!
//! Wires the format dispatcher, normalizer and layer store into the
//! operations exposed to the HTTP and command-line adapters.

pub mod ingestor;
pub mod markers;
pub mod models;
pub mod tables;

pub use ingestor::Ingestor;
pub use markers::markers_for;
pub use models::{GeoIngestResult, IngestOutcome, TableIngestResult};
pub use tables::{plot_points, TableRegistry};
