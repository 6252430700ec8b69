use serde::{Deserialize, Serialize};

/// A point handed to the map/session collaborator for every ingested
/// geospatial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    /// Rendered attribute summary (HTML fragment)
    pub popup: String,
    pub layer: String,
}

impl Marker {
    /// Render the attribute summary used as a marker popup
    pub fn render_popup<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
        pairs
            .into_iter()
            .map(|(column, value)| format!("<b>{}</b>: {}<br>", column, value))
            .collect()
    }

    /// GeoJSON point feature with `popup` and `layer` properties
    pub fn to_feature(&self) -> geojson::Feature {
        let mut properties = serde_json::Map::new();
        properties.insert("popup".to_string(), serde_json::Value::String(self.popup.clone()));
        properties.insert("layer".to_string(), serde_json::Value::String(self.layer.clone()));

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![self.lon, self.lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Collect markers into a FeatureCollection
pub fn markers_to_collection(markers: &[Marker]) -> geojson::FeatureCollection {
    geojson::FeatureCollection {
        bbox: None,
        features: markers.iter().map(Marker::to_feature).collect(),
        foreign_members: None,
    }
}
