//! Region entity and its display attributes.

use geo::{BoundingRect, Geometry, Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::contains;

/// Property keys accepted for each attribute, first match wins.
/// Older data exports used lowercase keys.
const AREA_KEYS: &[&str] = &["Name", "name", "area"];
const MICROMARKET_KEYS: &[&str] = &["Micromarket", "micromarket"];
const ZONE_KEYS: &[&str] = &["Zone", "zone"];

/// Display attributes of a region. Empty strings are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub micromarket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl RegionAttributes {
    pub fn new(area: Option<&str>, micromarket: Option<&str>, zone: Option<&str>) -> Self {
        Self {
            area: non_empty(area),
            micromarket: non_empty(micromarket),
            zone: non_empty(zone),
        }
    }

    /// Read attributes from a GeoJSON `properties` object.
    pub fn from_properties(properties: &Map<String, Value>) -> Self {
        Self {
            area: lookup(properties, AREA_KEYS),
            micromarket: lookup(properties, MICROMARKET_KEYS),
            zone: lookup(properties, ZONE_KEYS),
        }
    }

    /// True when no attribute carries a value
    pub fn is_empty(&self) -> bool {
        self.area.is_none() && self.micromarket.is_none() && self.zone.is_none()
    }

    pub fn area_or_empty(&self) -> &str {
        self.area.as_deref().unwrap_or("")
    }

    pub fn micromarket_or_empty(&self) -> &str {
        self.micromarket.as_deref().unwrap_or("")
    }

    pub fn zone_or_empty(&self) -> &str {
        self.zone.as_deref().unwrap_or("")
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn lookup(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| properties.get(*key))
        .find_map(|value| match value {
            Value::String(s) => non_empty(Some(s)),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
}

/// A catalog entry: prepared 2D geometry plus display attributes.
///
/// `position` is the load-order index and doubles as priority: lower wins.
#[derive(Debug, Clone)]
pub struct Region {
    pub position: usize,
    pub attributes: RegionAttributes,
    pub geometry: Geometry<f64>,
}

impl Region {
    pub fn new(position: usize, attributes: RegionAttributes, geometry: Geometry<f64>) -> Self {
        Self {
            position,
            attributes,
            geometry,
        }
    }

    /// Get the bounding rectangle of this region
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Strict containment, boundary points are outside
    pub fn contains(&self, point: &Point<f64>) -> bool {
        contains(point, &self.geometry)
    }
}
