pub mod bbox;
pub mod dataset;
pub mod geometry;
pub mod layer;
pub mod marker;
pub mod table;

pub use bbox::BoundingBox;
pub use dataset::{stringify_value, ColumnAligner, FeatureDataset, RawDataset, Record};
pub use geometry::{Crs, CrsTag, Geometry, GeometryType, WGS84_EPSG};
pub use layer::{validate_layer_name, LayerMeta};
pub use marker::{markers_to_collection, Marker};
pub use table::{TableHandle, TableRecord, TableRecordSet};
