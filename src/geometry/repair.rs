//! Polygon validation and repair.
//!
//! Self-intersecting or otherwise invalid polygons are rebuilt with a
//! zero-width boolean union, which resolves crossings into valid parts.

use geo::{BooleanOps, Coord, CoordsIter, MapCoords, MultiPolygon, Polygon, Validation};

use crate::error::GeometryError;

/// A polygon ready for containment tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Checked {
    /// Input was already valid
    Valid(Polygon<f64>),
    /// Input was invalid and has been rebuilt
    Repaired(MultiPolygon<f64>),
}

impl Checked {
    /// Append the resulting parts to `out`
    pub fn push_into(self, out: &mut Vec<Polygon<f64>>) {
        match self {
            Checked::Valid(polygon) => out.push(polygon),
            Checked::Repaired(multi) => out.extend(multi.0),
        }
    }

    pub fn is_repaired(&self) -> bool {
        matches!(self, Checked::Repaired(_))
    }
}

/// Validate a polygon, repairing it when needed.
pub fn check_polygon(polygon: Polygon<f64>) -> Result<Checked, GeometryError> {
    if polygon.is_valid() {
        return Ok(Checked::Valid(polygon));
    }

    let repaired = repair_polygon(&polygon);
    if repaired.0.is_empty() {
        return Err(GeometryError::RepairFailed);
    }
    Ok(Checked::Repaired(repaired))
}

/// Output coordinates this close to an input vertex are moved back onto it
const SNAP_TOLERANCE: f64 = 1e-9;

/// Union with the empty set: output is the valid cover of the input.
///
/// The union works on a precision grid, so surviving vertices come back
/// shifted by a tiny amount. They are snapped back to the input vertices so
/// the boundary (and with it the edges-are-outside rule) stays where the
/// source put it. Vertices created by the repair, such as crossing points,
/// keep the computed position.
pub fn repair_polygon(polygon: &Polygon<f64>) -> MultiPolygon<f64> {
    let repaired = polygon.union(&MultiPolygon::<f64>::new(Vec::new()));
    let originals: Vec<Coord<f64>> = polygon.coords_iter().collect();
    repaired.map_coords(|c| snap(c, &originals))
}

fn snap(coord: Coord<f64>, originals: &[Coord<f64>]) -> Coord<f64> {
    originals
        .iter()
        .find(|o| (o.x - coord.x).abs() <= SNAP_TOLERANCE && (o.y - coord.y).abs() <= SNAP_TOLERANCE)
        .copied()
        .unwrap_or(coord)
}
