use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geolayer_core::error::{GeolayerError, Result};
use geolayer_core::models::{
    validate_layer_name, BoundingBox, FeatureDataset, Geometry, LayerMeta, Record,
};
use geolayer_geo::spatial::{geometry_bounds, intersects_bbox};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::GpkgStore;
use crate::ports::{describe_layer, LayerStore};

fn store_err(context: &'static str) -> impl Fn(sqlx::Error) -> GeolayerError {
    move |e| GeolayerError::store_io(format!("{}: {}", context, e))
}

fn corrupt(layer: &str, detail: impl std::fmt::Display) -> GeolayerError {
    GeolayerError::store_io(format!("Corrupt feature data in layer '{}': {}", layer, detail))
}

/// One record encoded for the `layer_features` table
struct FeatureRow {
    fid: i64,
    geometry: Option<String>,
    attributes: String,
    envelope: Option<BoundingBox>,
}

impl FeatureRow {
    fn encode(fid: usize, record: &Record) -> Result<Self> {
        let geometry = record
            .geometry
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| GeolayerError::Serialization(e.to_string()))?;
        let attributes = serde_json::to_string(&record.attributes)
            .map_err(|e| GeolayerError::Serialization(e.to_string()))?;

        Ok(Self {
            fid: fid as i64,
            geometry,
            attributes,
            envelope: record.geometry.as_ref().and_then(geometry_bounds),
        })
    }
}

fn decode_record(layer: &str, row: &SqliteRow) -> Result<Record> {
    let geometry: Option<String> = row.try_get("geometry").map_err(|e| corrupt(layer, e))?;
    let attributes: String = row.try_get("attributes").map_err(|e| corrupt(layer, e))?;

    let geometry = geometry
        .map(|g| serde_json::from_str::<Geometry>(&g))
        .transpose()
        .map_err(|e| corrupt(layer, e))?;
    let attributes: Vec<String> = serde_json::from_str(&attributes).map_err(|e| corrupt(layer, e))?;

    Ok(Record::new(geometry, attributes))
}

fn decode_meta(row: &SqliteRow) -> Result<LayerMeta> {
    let name: String = row.try_get("name").map_err(store_err("Failed to read layer name"))?;
    let columns: String = row.try_get("columns").map_err(|e| corrupt(&name, e))?;
    let feature_count: i64 = row.try_get("feature_count").map_err(|e| corrupt(&name, e))?;
    let updated_at: DateTime<Utc> = row.try_get("last_change").map_err(|e| corrupt(&name, e))?;

    let extent: [Option<f64>; 4] = [
        row.try_get("min_x").map_err(|e| corrupt(&name, e))?,
        row.try_get("min_y").map_err(|e| corrupt(&name, e))?,
        row.try_get("max_x").map_err(|e| corrupt(&name, e))?,
        row.try_get("max_y").map_err(|e| corrupt(&name, e))?,
    ];
    let bbox = match extent {
        [Some(min_x), Some(min_y), Some(max_x), Some(max_y)] => {
            BoundingBox::new(min_x, min_y, max_x, max_y).ok()
        }
        _ => None,
    };

    Ok(LayerMeta {
        columns: serde_json::from_str(&columns).map_err(|e| corrupt(&name, e))?,
        feature_count: feature_count.max(0) as usize,
        bbox,
        updated_at,
        name,
    })
}

#[async_trait]
impl LayerStore for GpkgStore {
    async fn write_layer(&self, name: &str, dataset: &FeatureDataset) -> Result<LayerMeta> {
        validate_layer_name(name)?;

        let meta = describe_layer(name, dataset);
        let columns = serde_json::to_string(&dataset.columns)
            .map_err(|e| GeolayerError::Serialization(e.to_string()))?;
        let rows = dataset
            .records
            .iter()
            .enumerate()
            .map(|(fid, record)| FeatureRow::encode(fid, record))
            .collect::<Result<Vec<_>>>()?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(store_err("Failed to begin write"))?;

        sqlx::query("DELETE FROM layer_features WHERE layer = ?")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(store_err("Failed to clear layer"))?;

        sqlx::query(
            r#"
            INSERT INTO layer_contents
                (name, columns, feature_count, min_x, min_y, max_x, max_y, srs_id, last_change)
            VALUES (?, ?, ?, ?, ?, ?, ?, 4326, ?)
            ON CONFLICT (name) DO UPDATE
            SET columns = excluded.columns,
                feature_count = excluded.feature_count,
                min_x = excluded.min_x,
                min_y = excluded.min_y,
                max_x = excluded.max_x,
                max_y = excluded.max_y,
                last_change = excluded.last_change
            "#,
        )
        .bind(name)
        .bind(&columns)
        .bind(meta.feature_count as i64)
        .bind(meta.bbox.map(|b| b.min_x))
        .bind(meta.bbox.map(|b| b.min_y))
        .bind(meta.bbox.map(|b| b.max_x))
        .bind(meta.bbox.map(|b| b.max_y))
        .bind(meta.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err("Failed to write layer contents"))?;

        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO layer_features
                    (layer, fid, geometry, attributes, min_x, min_y, max_x, max_y)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(name)
            .bind(row.fid)
            .bind(row.geometry.as_deref())
            .bind(&row.attributes)
            .bind(row.envelope.map(|b| b.min_x))
            .bind(row.envelope.map(|b| b.min_y))
            .bind(row.envelope.map(|b| b.max_x))
            .bind(row.envelope.map(|b| b.max_y))
            .execute(&mut *tx)
            .await
            .map_err(store_err("Failed to write feature"))?;
        }

        tx.commit().await.map_err(store_err("Failed to commit layer"))?;

        tracing::info!(layer = name, features = meta.feature_count, "Wrote layer");
        Ok(meta)
    }

    async fn read_layer(&self, name: &str, bbox: &BoundingBox) -> Result<FeatureDataset> {
        // Both reads share one snapshot
        let mut tx = self.pool.begin().await.map_err(store_err("Failed to begin read"))?;

        let columns: Option<String> =
            sqlx::query_scalar("SELECT columns FROM layer_contents WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err("Failed to look up layer"))?;
        let columns = columns.ok_or_else(|| GeolayerError::LayerNotFound {
            name: name.to_string(),
        })?;
        let columns: Vec<String> = serde_json::from_str(&columns).map_err(|e| corrupt(name, e))?;

        let rows = sqlx::query(
            r#"
            SELECT geometry, attributes
            FROM layer_features
            WHERE layer = ?
              AND max_x >= ? AND min_x <= ?
              AND max_y >= ? AND min_y <= ?
            ORDER BY fid
            "#,
        )
        .bind(name)
        .bind(bbox.min_x)
        .bind(bbox.max_x)
        .bind(bbox.min_y)
        .bind(bbox.max_y)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err("Failed to read features"))?;

        tx.commit().await.map_err(store_err("Failed to finish read"))?;

        let candidates = rows.len();
        let mut records = Vec::with_capacity(candidates);
        for row in &rows {
            let record = decode_record(name, row)?;
            if record.geometry.as_ref().is_some_and(|g| intersects_bbox(g, bbox)) {
                records.push(record);
            }
        }

        tracing::debug!(layer = name, candidates, matched = records.len(), "Read layer slice");
        Ok(FeatureDataset::new(columns, records))
    }

    async fn list_layers(&self) -> Result<Vec<LayerMeta>> {
        let rows = sqlx::query(
            r#"
            SELECT name, columns, feature_count, min_x, min_y, max_x, max_y, last_change
            FROM layer_contents
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("Failed to list layers"))?;

        rows.iter().map(decode_meta).collect()
    }

    async fn has_layer(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM layer_contents WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("Failed to look up layer"))?;
        Ok(found.is_some())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err("Health check failed"))?;
        Ok(())
    }
}
