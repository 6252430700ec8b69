//! GeoLayer Geo - CRS reprojection, normalization, and spatial predicates
//!
//! This crate turns raw loader output into normalized WGS84 datasets and
//! provides the bounding-box predicates and spatial index used by the stores.

pub mod index;
pub mod models;
pub mod normalize;
pub mod spatial;
pub mod transform;

pub use index::SpatialIndex;
pub use normalize::{NormalizeReport, Normalizer};
pub use spatial::{display_point, geometry_bounds, intersects_bbox};
pub use transform::Reprojector;
