//! R-tree index over the records of a normalized dataset

use crate::spatial::{geometry_bounds, intersects_bbox};
use geolayer_core::models::{BoundingBox, FeatureDataset};
use rstar::{RTree, RTreeObject, AABB};

/// Record position plus its envelope
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    /// Position of the record in the indexed dataset
    pub id: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index for bounding-box reads
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedGeometry>,
}

impl SpatialIndex {
    /// Bulk-load an index for every record with a non-empty geometry
    pub fn build(dataset: &FeatureDataset) -> Self {
        let indexed: Vec<IndexedGeometry> = dataset
            .records
            .iter()
            .enumerate()
            .filter_map(|(id, record)| {
                let bounds = geometry_bounds(record.geometry.as_ref()?)?;
                Some(IndexedGeometry {
                    id,
                    envelope: AABB::from_corners(
                        [bounds.min_x, bounds.min_y],
                        [bounds.max_x, bounds.max_y],
                    ),
                })
            })
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Record ids whose envelope overlaps `bbox`, ascending
    pub fn candidates(&self, bbox: &BoundingBox) -> Vec<usize> {
        let query = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|g| g.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Records of `dataset` (the one this index was built from) that
    /// intersect `bbox`, in dataset order
    pub fn query(&self, dataset: &FeatureDataset, bbox: &BoundingBox) -> FeatureDataset {
        let records = self
            .candidates(bbox)
            .into_iter()
            .filter_map(|id| dataset.records.get(id))
            .filter(|r| r.geometry.as_ref().is_some_and(|g| intersects_bbox(g, bbox)))
            .cloned()
            .collect();
        FeatureDataset::new(dataset.columns.clone(), records)
    }
}
