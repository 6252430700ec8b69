//! Bounding-box predicates and display-point derivation

use crate::models::to_geo_geometry;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::centroid::Centroid;
use geo::algorithm::intersects::Intersects;
use geo::{coord, Rect};
use geolayer_core::models::{BoundingBox, FeatureDataset, Geometry};

/// Convert a query box into a `geo::Rect`
pub fn bbox_to_rect(bbox: &BoundingBox) -> Rect {
    Rect::new(
        coord! { x: bbox.min_x, y: bbox.min_y },
        coord! { x: bbox.max_x, y: bbox.max_y },
    )
}

/// Envelope of a geometry; `None` for empty geometries
pub fn geometry_bounds(geometry: &Geometry) -> Option<BoundingBox> {
    let rect = to_geo_geometry(geometry).bounding_rect()?;
    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y).ok()
}

/// Exact intersection test between a geometry and a query box (edges inclusive)
pub fn intersects_bbox(geometry: &Geometry, bbox: &BoundingBox) -> bool {
    to_geo_geometry(geometry).intersects(&bbox_to_rect(bbox))
}

/// Extent covering every record of a dataset
pub fn dataset_extent(dataset: &FeatureDataset) -> Option<BoundingBox> {
    dataset
        .records
        .iter()
        .filter_map(|r| r.geometry.as_ref().and_then(geometry_bounds))
        .reduce(|acc, b| acc.union(&b))
}

/// Full-scan filter: records whose geometry intersects `bbox`, in order
pub fn filter_by_bbox(dataset: &FeatureDataset, bbox: &BoundingBox) -> FeatureDataset {
    let records = dataset
        .records
        .iter()
        .filter(|r| r.geometry.as_ref().is_some_and(|g| intersects_bbox(g, bbox)))
        .cloned()
        .collect();
    FeatureDataset::new(dataset.columns.clone(), records)
}

/// Single display point `[lon, lat]` for a geometry
///
/// Points use their own coordinate; everything else uses its centroid.
/// Returns `None` for degenerate geometries without a centroid.
pub fn display_point(geometry: &Geometry) -> Option<[f64; 2]> {
    match geometry {
        Geometry::Point { coordinates } => Some(*coordinates),
        other => {
            let centroid = to_geo_geometry(other).centroid()?;
            let (x, y) = centroid.x_y();
            (x.is_finite() && y.is_finite()).then_some([x, y])
        }
    }
}
