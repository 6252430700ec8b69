//! Property tests for normalization and bounding-box filtering

use geolayer_core::models::{BoundingBox, CrsTag, FeatureDataset, Geometry, RawDataset, Record};
use geolayer_geo::index::SpatialIndex;
use geolayer_geo::spatial::{filter_by_bbox, geometry_bounds, intersects_bbox};
use geolayer_geo::Normalizer;
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = [f64; 2]> {
    (-170.0f64..170.0, -80.0f64..80.0).prop_map(|(x, y)| [x, y])
}

fn square() -> impl Strategy<Value = Vec<Vec<[f64; 2]>>> {
    (coord(), 0.01f64..5.0).prop_map(|([x, y], size)| {
        vec![vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]]
    })
}

fn geometry() -> impl Strategy<Value = Geometry> {
    prop_oneof![
        coord().prop_map(|[x, y]| Geometry::point(x, y)),
        prop::collection::vec(coord(), 2..5).prop_map(Geometry::line_string),
        square().prop_map(Geometry::polygon),
        prop::collection::vec(coord(), 1..5)
            .prop_map(|coordinates| Geometry::MultiPoint { coordinates }),
        prop::collection::vec(square(), 1..4).prop_map(Geometry::multi_polygon),
    ]
}

fn bbox() -> impl Strategy<Value = BoundingBox> {
    (coord(), 0.0f64..60.0, 0.0f64..60.0).prop_map(|([x, y], w, h)| {
        BoundingBox::new(x, y, x + w, y + h).unwrap()
    })
}

fn raw_dataset(crs: CrsTag, geometries: Vec<Geometry>) -> RawDataset {
    let records = geometries
        .into_iter()
        .enumerate()
        .map(|(i, g)| Record::new(Some(g), vec![i.to_string()]))
        .collect();
    RawDataset {
        name: "generated".to_string(),
        format: "GeoJSON".to_string(),
        crs,
        columns: vec!["id".to_string()],
        records,
    }
}

fn flatten(geometry: &Geometry) -> Vec<[f64; 2]> {
    match geometry {
        Geometry::Point { coordinates } => vec![*coordinates],
        Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
            coordinates.clone()
        }
        Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
            coordinates.concat()
        }
        Geometry::MultiPolygon { coordinates } => {
            coordinates.iter().flat_map(|p| p.concat()).collect()
        }
        Geometry::GeometryCollection { geometries } => geometries.iter().flat_map(flatten).collect(),
    }
}

proptest! {
    #[test]
    fn normalized_records_are_never_multipart(
        geometries in prop::collection::vec(geometry(), 1..20),
    ) {
        let (dataset, report) = Normalizer
            .normalize(raw_dataset(CrsTag::Absent, geometries.clone()))
            .unwrap();

        prop_assert_eq!(report.dropped_empty, 0);
        for record in &dataset.records {
            prop_assert!(!record.geometry.as_ref().unwrap().is_multipart());
        }

        let expected: usize = geometries
            .iter()
            .map(|g| match g {
                Geometry::MultiPoint { coordinates } => coordinates.len(),
                Geometry::MultiPolygon { coordinates } => coordinates.len(),
                _ => 1,
            })
            .sum();
        prop_assert_eq!(dataset.len(), expected);
    }

    #[test]
    fn normalizing_wgs84_keeps_coordinates(
        geometries in prop::collection::vec(geometry(), 1..20),
    ) {
        let before: Vec<[f64; 2]> = geometries.iter().flat_map(flatten).collect();

        let (dataset, report) = Normalizer
            .normalize(raw_dataset(CrsTag::Epsg(4326), geometries))
            .unwrap();
        prop_assert_eq!(report.reprojected_from, None);

        let after: Vec<[f64; 2]> = dataset
            .records
            .iter()
            .flat_map(|r| flatten(r.geometry.as_ref().unwrap()))
            .collect();

        prop_assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            prop_assert!((a[0] - b[0]).abs() < 1e-12);
            prop_assert!((a[1] - b[1]).abs() < 1e-12);
        }
    }

    #[test]
    fn bbox_filter_has_no_false_results(
        geometries in prop::collection::vec(geometry(), 1..30),
        query in bbox(),
    ) {
        let (dataset, _) = Normalizer
            .normalize(raw_dataset(CrsTag::Absent, geometries))
            .unwrap();

        let filtered = filter_by_bbox(&dataset, &query);
        for record in &filtered.records {
            prop_assert!(intersects_bbox(record.geometry.as_ref().unwrap(), &query));
        }

        let expected = dataset
            .records
            .iter()
            .filter(|r| intersects_bbox(r.geometry.as_ref().unwrap(), &query))
            .count();
        prop_assert_eq!(filtered.len(), expected);

        // The index agrees with the full scan
        let index = SpatialIndex::build(&dataset);
        prop_assert_eq!(index.query(&dataset, &query), filtered);
    }

    #[test]
    fn extent_query_returns_everything(
        geometries in prop::collection::vec(geometry(), 1..20),
    ) {
        let (dataset, _) = Normalizer
            .normalize(raw_dataset(CrsTag::Absent, geometries))
            .unwrap();

        let extent = dataset
            .records
            .iter()
            .filter_map(|r| geometry_bounds(r.geometry.as_ref().unwrap()))
            .reduce(|a, b| a.union(&b))
            .unwrap();

        let filtered: FeatureDataset = filter_by_bbox(&dataset, &extent);
        prop_assert_eq!(filtered.len(), dataset.len());
    }
}
