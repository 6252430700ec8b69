//! Integration tests for command output
//!
//! These run the built binary against a temporary store and check that JSON
//! output is well-formed and reflects what was ingested.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const BALI: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"name": "Ubud"},
     "geometry": {"type": "Point", "coordinates": [115.26, -8.51]}},
    {"type": "Feature", "properties": {"name": "Denpasar"},
     "geometry": {"type": "Point", "coordinates": [115.22, -8.65]}},
    {"type": "Feature", "properties": {"name": "Jakarta"},
     "geometry": {"type": "Point", "coordinates": [106.82, -6.17]}}
  ]
}"#;

fn geolayer(dir: &Path, args: &[&str]) -> Output {
    let store = dir.join("store").join("uploads.gpkg");
    Command::new(env!("CARGO_BIN_EXE_geolayer"))
        .current_dir(dir)
        .env_remove("GEOLAYER_STORE_PATH")
        .env_remove("GEOLAYER_PORT")
        .arg("--store")
        .arg(&store)
        .arg("--scratch-dir")
        .arg(dir.join("scratch"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_ingest_then_list_and_slice() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bali.geojson"), BALI).unwrap();

    let output = geolayer(dir.path(), &["ingest", "bali.geojson", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["data"]["layer"], "bali");
    assert_eq!(parsed["data"]["feature_count"], 3);
    assert_eq!(parsed["data"]["crs_assumed"], true);

    let output = geolayer(dir.path(), &["layers", "--json"]);
    assert!(output.status.success());
    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["layers"][0]["name"], "bali");

    let output = geolayer(dir.path(), &["slice", "bali", "--bbox", "115,-9,116,-8", "--json"]);
    assert!(output.status.success());
    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["type"], "FeatureCollection");
    assert_eq!(parsed["data"]["features"].as_array().unwrap().len(), 2);
}

#[test]
fn test_slice_writes_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bali.geojson"), BALI).unwrap();
    assert!(geolayer(dir.path(), &["ingest", "bali.geojson"]).status.success());

    let output = geolayer(dir.path(), &["slice", "bali", "-o", "out.geojson"]);
    assert!(output.status.success());

    let written = std::fs::read_to_string(dir.path().join("out.geojson")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["features"].as_array().unwrap().len(), 3);
}

#[test]
fn test_unknown_layer_fails() {
    let dir = TempDir::new().unwrap();
    let output = geolayer(dir.path(), &["slice", "missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Layer not found: missing"));
}

#[test]
fn test_bad_bbox_fails() {
    let dir = TempDir::new().unwrap();
    let output = geolayer(dir.path(), &["slice", "any", "--bbox", "1,2,3"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid bounding box"));
}

#[test]
fn test_table_preview_and_plot() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("sites.csv"),
        "site,lat,lon\nA,-8.5,115.2\nB,-8.6,115.1\nC,,115.0\n",
    )
    .unwrap();

    let output = geolayer(dir.path(), &["table", "sites.csv", "--lat", "lat", "--lon", "lon", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["table"]["columns"], serde_json::json!(["site", "lat", "lon"]));
    assert_eq!(parsed["data"]["table"]["row_count"], 3);
    assert_eq!(parsed["data"]["geojson"]["features"].as_array().unwrap().len(), 2);

    // Tables never create a store
    assert!(!dir.path().join("store").exists());
}

#[test]
fn test_config_reports_sources() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_geolayer"))
        .current_dir(dir.path())
        .env("GEOLAYER_PORT", "8080")
        .args(["config", "--json", "--store", "custom.gpkg"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let parsed = json_stdout(&output);
    let values = parsed["data"]["values"].as_array().unwrap();
    let find = |key: &str| values.iter().find(|v| v["key"] == key).unwrap().clone();

    assert_eq!(find("port")["value"], "8080");
    assert_eq!(find("port")["source"], "Environment");
    assert_eq!(find("store_path")["value"], "custom.gpkg");
    assert_eq!(find("store_path")["source"], "Cli");
    assert_eq!(find("preview_rows")["source"], "Default");
}
