//! Coarse bounding-box fallback, consulted only when no catalog region
//! contains the query point.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Axis-aligned rectangle in degrees: `[min_lon, min_lat, max_lon, max_lat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Inclusive on all four sides
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.min_lon <= lon && lon <= self.max_lon && self.min_lat <= lat && lat <= self.max_lat
    }

    /// Min does not exceed max on either axis and all bounds are finite
    pub fn is_well_formed(&self) -> bool {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lon <= self.max_lon
            && self.min_lat <= self.max_lat
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(b: [f64; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_lon, b.min_lat, b.max_lon, b.max_lat]
    }
}

/// A named fallback rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedBox {
    pub name: String,
    pub bbox: BoundingBox,
}

impl NamedBox {
    pub fn new(name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bbox,
        }
    }
}

/// Known Bangalore localities used when no fallback list is configured
pub fn default_boxes() -> Vec<NamedBox> {
    vec![
        NamedBox::new("BTM Layout", BoundingBox::new(77.60, 12.90, 77.63, 12.94)),
        NamedBox::new("Koramangala", BoundingBox::new(77.61, 12.93, 77.65, 12.98)),
        NamedBox::new("Hebbal", BoundingBox::new(77.58, 13.04, 77.62, 13.06)),
        NamedBox::new("Yelahanka", BoundingBox::new(77.57, 13.09, 77.62, 13.14)),
    ]
}

/// Ordered list of named boxes. The first box containing a point wins.
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxFallback {
    boxes: Vec<NamedBox>,
}

impl BoundingBoxFallback {
    /// Malformed boxes are skipped with a warning
    pub fn new(boxes: Vec<NamedBox>) -> Self {
        let boxes = boxes
            .into_iter()
            .filter(|b| {
                let ok = b.bbox.is_well_formed();
                if !ok {
                    warn!("Skipping malformed fallback box '{}': {:?}", b.name, b.bbox);
                }
                ok
            })
            .collect();
        Self { boxes }
    }

    /// No fallback at all
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Boxes in configured order
    pub fn iter(&self) -> impl Iterator<Item = &NamedBox> + '_ {
        self.boxes.iter()
    }

    /// First box containing the point
    pub fn find(&self, lon: f64, lat: f64) -> Option<&NamedBox> {
        self.boxes.iter().find(|b| b.bbox.contains(lon, lat))
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
