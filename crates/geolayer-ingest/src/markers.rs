use geolayer_core::models::{FeatureDataset, Marker};
use geolayer_geo::display_point;

/// One marker per record with a usable display point
///
/// Degenerate geometries without a centroid produce no marker.
pub fn markers_for(layer: &str, dataset: &FeatureDataset) -> Vec<Marker> {
    dataset
        .records
        .iter()
        .filter_map(|record| {
            let [lon, lat] = display_point(record.geometry.as_ref()?)?;
            Some(Marker {
                lat,
                lon,
                popup: Marker::render_popup(dataset.attribute_pairs(record)),
                layer: layer.to_string(),
            })
        })
        .collect()
}
