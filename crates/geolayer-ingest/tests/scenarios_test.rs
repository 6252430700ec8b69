//! End-to-end ingestion scenarios against a file-backed store

use geolayer_core::models::{BoundingBox, Geometry};
use geolayer_core::{ErrorKind, GeolayerError};
use geolayer_geo::transform::within_wgs84_range;
use geolayer_ingest::{IngestOutcome, Ingestor};
use geolayer_store::{GpkgStore, LayerStore};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

struct Harness {
    dir: TempDir,
    ingestor: Ingestor<GpkgStore>,
}

impl Harness {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = GpkgStore::open(dir.path().join("uploads.gpkg")).await.unwrap();
        let ingestor = Ingestor::new(store, dir.path().join("scratch"));
        Self { dir, ingestor }
    }

    fn upload(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn scratch_entries(&self) -> usize {
        fs::read_dir(self.dir.path().join("scratch")).map(|d| d.count()).unwrap_or(0)
    }
}

fn write_kmz(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default().compression_method(zip::CompressionMethod::Stored))
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

const WEB_MERCATOR_PRJ: &str = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","3857"]]"#;

fn square(origin: f64, size: f64) -> PolygonRing<Point> {
    PolygonRing::Outer(vec![
        Point::new(origin, origin),
        Point::new(origin, origin + size),
        Point::new(origin + size, origin + size),
        Point::new(origin + size, origin),
        Point::new(origin, origin),
    ])
}

/// Write a one-record shapefile holding a two-part polygon in EPSG:3857
fn write_parcels_shapefile(path: &Path) {
    let table = TableWriterBuilder::new().add_character_field("parcel".try_into().unwrap(), 20);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();

    let shape = Polygon::with_rings(vec![square(1_000_000.0, 100_000.0), square(2_000_000.0, 100_000.0)]);
    let mut record = Record::default();
    record.insert("parcel".to_string(), FieldValue::Character(Some("A-1".to_string())));
    writer.write_shape_and_record(&shape, &record).unwrap();
    drop(writer);

    fs::write(path.with_extension("prj"), WEB_MERCATOR_PRJ).unwrap();
}

const THREE_POINTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"name": "Ubud", "rank": 1},
     "geometry": {"type": "Point", "coordinates": [115.26, -8.51]}},
    {"type": "Feature", "properties": {"name": "Denpasar", "rank": 2},
     "geometry": {"type": "Point", "coordinates": [115.22, -8.65]}},
    {"type": "Feature", "properties": {"name": "Singaraja", "rank": null},
     "geometry": {"type": "Point", "coordinates": [115.09, -8.11]}}
  ]
}"#;

#[tokio::test]
async fn scenario_geojson_without_crs_is_stored_as_wgs84() {
    let harness = Harness::new().await;
    let path = harness.upload("bali.geojson", THREE_POINTS.as_bytes());

    let result = harness.ingestor.ingest_geospatial(&path, "bali.geojson").await.unwrap();
    assert_eq!(result.layer, "bali");
    assert!(result.report.crs_assumed);
    assert_eq!(result.collection.features.len(), 3);
    assert_eq!(result.markers.len(), 3);
    assert_eq!(result.markers[0].lat, -8.51);
    assert_eq!(result.markers[0].lon, 115.26);

    let bbox = BoundingBox::new(115.0, -9.0, 116.0, -8.0).unwrap();
    let slice = harness.ingestor.layer_slice("bali", &bbox).await.unwrap();
    assert_eq!(slice.features.len(), 3);

    let json = serde_json::to_value(&slice).unwrap();
    assert!(json.get("crs").is_none());
    assert_eq!(json["features"][2]["properties"]["rank"], "");
    assert_eq!(json["features"][0]["properties"]["rank"], "1");
}

#[tokio::test]
async fn scenario_kmz_without_kml_creates_no_layer() {
    let harness = Harness::new().await;
    let path = harness.dir.path().join("photos.kmz");
    write_kmz(&path, &[("images/a.png", "png"), ("readme.txt", "hello")]);

    let err = harness.ingestor.ingest_geospatial(&path, "photos.kmz").await.unwrap_err();
    assert!(matches!(err, GeolayerError::NoEmbeddedFile { .. }));

    assert!(!harness.ingestor.store().has_layer("photos").await.unwrap());
    assert!(harness.ingestor.list_layers().await.unwrap().is_empty());
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn scenario_projected_shapefile_multipolygon_is_exploded_and_reprojected() {
    let harness = Harness::new().await;
    let path = harness.dir.path().join("parcels.shp");
    write_parcels_shapefile(&path);

    let result = harness.ingestor.ingest_geospatial(&path, "parcels.shp").await.unwrap();
    assert_eq!(result.layer, "parcels");
    assert!(!result.report.crs_assumed);
    assert_eq!(result.report.reprojected_from.as_deref(), Some("EPSG:3857"));
    assert_eq!(result.report.exploded, 1);
    assert_eq!(result.meta.feature_count, 2);

    let slice = harness
        .ingestor
        .store()
        .read_layer("parcels", &BoundingBox::world())
        .await
        .unwrap();
    assert_eq!(slice.len(), 2);
    for record in &slice.records {
        let geometry = record.geometry.as_ref().unwrap();
        assert!(matches!(geometry, Geometry::Polygon { .. }));
        assert!(within_wgs84_range(geometry));
        assert_eq!(record.attributes, vec!["A-1"]);
    }

    let bounds = result.meta.bbox.unwrap();
    assert!(bounds.min_x > 8.9 && bounds.min_x < 9.0);
    assert!(bounds.max_x > 18.8 && bounds.max_x < 18.9);
}

#[tokio::test]
async fn scenario_projected_multipolygon_is_exploded_and_reprojected() {
    let harness = Harness::new().await;
    let content = r#"{
      "type": "FeatureCollection",
      "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}},
      "features": [{
        "type": "Feature",
        "properties": {"parcel": "A-1"},
        "geometry": {"type": "MultiPolygon", "coordinates": [
          [[[1000000, 1000000], [1100000, 1000000], [1100000, 1100000], [1000000, 1100000], [1000000, 1000000]]],
          [[[2000000, 2000000], [2100000, 2000000], [2100000, 2100000], [2000000, 2100000], [2000000, 2000000]]]
        ]}
      }]
    }"#;
    let path = harness.upload("parcels.geojson", content.as_bytes());

    let result = harness.ingestor.ingest_geospatial(&path, "parcels.geojson").await.unwrap();
    assert_eq!(result.report.reprojected_from.as_deref(), Some("EPSG:3857"));
    assert_eq!(result.report.exploded, 1);
    assert_eq!(result.meta.feature_count, 2);

    let slice = harness
        .ingestor
        .store()
        .read_layer("parcels", &BoundingBox::world())
        .await
        .unwrap();
    assert_eq!(slice.len(), 2);
    for record in &slice.records {
        let geometry = record.geometry.as_ref().unwrap();
        assert!(matches!(geometry, Geometry::Polygon { .. }));
        assert!(within_wgs84_range(geometry));
        assert_eq!(record.attributes, vec!["A-1"]);
    }

    // Roughly 9 to 10 degrees east for the first part
    let bounds = result.meta.bbox.unwrap();
    assert!(bounds.min_x > 8.9 && bounds.min_x < 9.0);
}

#[tokio::test]
async fn scenario_unknown_layer_is_not_found() {
    let harness = Harness::new().await;
    let err = harness
        .ingestor
        .layer_slice("never_ingested", &BoundingBox::world())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LayerNotFound);
}

#[tokio::test]
async fn scenario_csv_with_malformed_row() {
    let harness = Harness::new().await;
    let mut csv = String::from("name,lat,lon\n");
    for i in 0..10 {
        if i == 4 {
            csv.push_str("broken,1.0,2.0,unexpected,extra\n");
        } else {
            csv.push_str(&format!("site{},{}.5,{}.25\n", i, i, i + 100));
        }
    }
    let path = harness.upload("sites.csv", csv.as_bytes());

    let outcome = harness.ingestor.ingest(&path, "sites.csv").await.unwrap();
    let IngestOutcome::Tabular(result) = outcome else {
        panic!("expected a tabular outcome");
    };
    assert_eq!(result.table.len(), 9);
    assert_eq!(result.table.skipped_rows, 1);
    assert_eq!(result.columns(), ["name", "lat", "lon"]);
    assert_eq!(result.preview().len(), 5);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["preview"][0]["name"], "site0");
    assert_eq!(json["row_count"], 9);

    let points = harness.ingestor.plot_table(&result.handle, "lat", "lon").unwrap();
    assert_eq!(points.features.len(), 9);
}

#[tokio::test]
async fn failed_reingestion_keeps_previous_layer() {
    let harness = Harness::new().await;
    let path = harness.upload("towns.geojson", THREE_POINTS.as_bytes());
    harness.ingestor.ingest_geospatial(&path, "towns.geojson").await.unwrap();

    let broken = harness.upload("broken.geojson", b"{\"type\": \"FeatureCollection\", \"features\": [");
    let err = harness.ingestor.ingest_geospatial(&broken, "towns.geojson").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GeoReadError);

    let slice = harness.ingestor.layer_slice("towns", &BoundingBox::world()).await.unwrap();
    assert_eq!(slice.features.len(), 3);
}

#[tokio::test]
async fn kmz_upload_becomes_layer_named_after_archive() {
    let harness = Harness::new().await;
    let kml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Summit</name>
      <Point><coordinates>115.508,-8.343,3031</coordinates></Point>
    </Placemark>
  </Document>
</kml>"#;
    let path = harness.dir.path().join("Hike.kmz");
    write_kmz(&path, &[("doc.kml", kml)]);

    let result = harness.ingestor.ingest_geospatial(&path, "Hike.kmz").await.unwrap();
    assert_eq!(result.layer, "Hike");
    assert_eq!(result.markers.len(), 1);
    assert!(result.markers[0].popup.contains("Summit"));
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let harness = Harness::new().await;
    let path = harness.upload("notes.txt", b"hello");

    let err = harness.ingestor.ingest(&path, "notes.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[tokio::test]
async fn geojson_without_geometry_is_rejected() {
    let harness = Harness::new().await;
    let content = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"a": 1}, "geometry": null}
    ]}"#;
    let path = harness.upload("nogeom.geojson", content.as_bytes());

    let err = harness.ingestor.ingest_geospatial(&path, "nogeom.geojson").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyOrNoGeometry);
    assert!(!harness.ingestor.store().has_layer("nogeom").await.unwrap());
}
