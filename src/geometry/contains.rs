//! Point-in-region containment.
//!
//! Boundary convention: a point lying exactly on any edge, exterior or
//! hole, is outside. Two regions sharing a border therefore never both
//! claim a border point.

use geo::{Contains, Geometry, MultiPolygon, Point, Polygon};

/// Test a point against a prepared geometry.
///
/// Only polygons and multi-polygons can contain anything; every other
/// geometry type is treated as non-matching.
pub fn contains(point: &Point<f64>, geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Polygon(polygon) => polygon_contains(point, polygon),
        Geometry::MultiPolygon(multi) => multi_polygon_contains(point, multi),
        _ => false,
    }
}

/// Inside the exterior ring and outside (not on) every hole.
pub fn polygon_contains(point: &Point<f64>, polygon: &Polygon<f64>) -> bool {
    polygon.contains(point)
}

/// Union semantics: stops at the first member that contains the point.
pub fn multi_polygon_contains(point: &Point<f64>, multi: &MultiPolygon<f64>) -> bool {
    multi.0.iter().any(|polygon| polygon_contains(point, polygon))
}
