use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GeolayerError, Result};

/// Axis-aligned query rectangle in WGS84 degrees. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Query parameter names, in (minX, minY, maxX, maxY) order
    pub const PARAMS: [&'static str; 4] = ["minx", "miny", "maxx", "maxy"];

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(GeolayerError::BadBBox {
                reason: "coordinates must be finite numbers".to_string(),
            });
        }
        if min_x > max_x || min_y > max_y {
            return Err(GeolayerError::BadBBox {
                reason: format!(
                    "min must not exceed max (got {}, {}, {}, {})",
                    min_x, min_y, max_x, max_y
                ),
            });
        }
        Ok(Self { min_x, min_y, max_x, max_y })
    }

    /// Box covering the whole WGS84 coordinate range
    pub fn world() -> Self {
        Self { min_x: -180.0, min_y: -90.0, max_x: 180.0, max_y: 90.0 }
    }

    /// Parse from `minx`, `miny`, `maxx`, `maxy` query parameters
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self> {
        let mut values = [0.0; 4];
        for (slot, key) in values.iter_mut().zip(Self::PARAMS) {
            let raw = params.get(key).ok_or_else(|| GeolayerError::BadBBox {
                reason: format!("missing parameter '{}'", key),
            })?;
            *slot = raw.trim().parse::<f64>().map_err(|_| GeolayerError::BadBBox {
                reason: format!("parameter '{}' is not a number: '{}'", key, raw),
            })?;
        }
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Parse `minx,miny,maxx,maxy`
    pub fn parse_csv(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeolayerError::BadBBox {
                reason: format!("expected 4 comma-separated values, got {}", parts.len()),
            });
        }
        let params = Self::PARAMS
            .iter()
            .zip(parts)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_query(&params)
    }

    /// Envelope overlap test (inclusive edges)
    pub fn intersects_envelope(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_from_query() {
        let bbox = BoundingBox::from_query(&params(&[
            ("minx", "-10"),
            ("miny", "-5.5"),
            ("maxx", "10"),
            ("maxy", "5.5"),
        ]))
        .unwrap();
        assert_eq!(bbox, BoundingBox::new(-10.0, -5.5, 10.0, 5.5).unwrap());
    }

    #[test]
    fn test_missing_or_non_numeric_params() {
        let missing = BoundingBox::from_query(&params(&[("minx", "0"), ("miny", "0")]));
        assert!(matches!(missing, Err(GeolayerError::BadBBox { .. })));

        let garbage = BoundingBox::from_query(&params(&[
            ("minx", "a"),
            ("miny", "0"),
            ("maxx", "1"),
            ("maxy", "1"),
        ]));
        assert!(matches!(garbage, Err(GeolayerError::BadBBox { .. })));
    }

    #[test]
    fn test_inverted_and_nan_rejected() {
        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_parse_csv() {
        let bbox = BoundingBox::parse_csv("0, 1, 2, 3").unwrap();
        assert_eq!(bbox.max_y, 3.0);
        assert!(BoundingBox::parse_csv("0,1,2").is_err());
    }

    #[test]
    fn test_envelope_intersection_touching_edges() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = BoundingBox::new(1.0, 1.0, 2.0, 2.0).unwrap();
        let c = BoundingBox::new(1.5, 1.5, 2.0, 2.0).unwrap();
        assert!(a.intersects_envelope(&b));
        assert!(!a.intersects_envelope(&c));
        assert_eq!(a.union(&c), BoundingBox::new(0.0, 0.0, 2.0, 2.0).unwrap());
    }
}
