//! Decoded but unvalidated catalog input.

use super::RegionAttributes;

/// One position: longitude, latitude and optionally elevation (ignored).
pub type RawPosition = Vec<f64>;

/// Ordered positions of one ring, open or closed.
pub type RawRing = Vec<RawPosition>;

/// Geometry payload as handed over by a source adapter.
///
/// Ring order is authoritative: ring 0 is the exterior, every later ring
/// is a hole.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    Polygon(Vec<RawRing>),
    MultiPolygon(Vec<Vec<RawRing>>),
    /// Any other geometry type, keeps the type name for diagnostics
    Unsupported(String),
}

impl RawGeometry {
    /// GeoJSON-style type name
    pub fn type_name(&self) -> &str {
        match self {
            RawGeometry::Polygon(_) => "Polygon",
            RawGeometry::MultiPolygon(_) => "MultiPolygon",
            RawGeometry::Unsupported(name) => name,
        }
    }
}

/// One `(geometry, attributes)` catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRegion {
    pub geometry: RawGeometry,
    pub attributes: RegionAttributes,
}

impl RawRegion {
    pub fn new(geometry: RawGeometry, attributes: RegionAttributes) -> Self {
        Self {
            geometry,
            attributes,
        }
    }
}
