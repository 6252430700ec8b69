//! GeoLayer Store - Layer storage port and adapters
//!
//! This crate defines the `LayerStore` port and provides a file-backed
//! multi-layer container plus an in-memory implementation.

pub mod gpkg;
pub mod memory;
pub mod ports;

pub use gpkg::GpkgStore;
pub use memory::MemoryLayerStore;
pub use ports::{describe_layer, LayerStore};
