//! Ring normalization: raw positions to closed 2D rings.
//!
//! Elevation and any further components are dropped from every position.
//! A ring is rejected when a position is short or non-finite, when fewer
//! than three distinct points remain, or when all points lie on one line. Rejection of any ring rejects its
//! polygon; callers decide whether the owning region survives.

use geo::{Coord, LineString, Polygon};
use hashbrown::HashSet;

use crate::error::GeometryError;
use crate::models::{RawPosition, RawRing};

/// Normalize one ring. `ring_index` is only used for error reporting.
pub fn normalize_ring(ring_index: usize, raw: &[RawPosition]) -> Result<LineString<f64>, GeometryError> {
    if raw.is_empty() {
        return Err(GeometryError::EmptyCoordinates);
    }

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(raw.len() + 1);
    for (point_index, position) in raw.iter().enumerate() {
        if position.len() < 2 {
            return Err(GeometryError::ShortPosition {
                ring: ring_index,
                point: point_index,
                components: position.len(),
            });
        }

        let (x, y) = (position[0], position[1]);
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFinitePosition {
                ring: ring_index,
                point: point_index,
            });
        }
        coords.push(Coord { x, y });
    }

    coords.dedup();

    // Closing point is re-added below
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }

    let distinct = distinct_count(&coords);
    if distinct < 3 {
        return Err(GeometryError::DegenerateRing {
            ring: ring_index,
            distinct,
        });
    }

    if is_collinear(&coords) {
        return Err(GeometryError::CollinearRing { ring: ring_index });
    }

    coords.push(coords[0]);
    Ok(LineString::new(coords))
}

/// Normalize a list of rings; the first failing ring fails the whole list.
pub fn normalize_rings(raw: &[RawRing]) -> Result<Vec<LineString<f64>>, GeometryError> {
    raw.iter()
        .enumerate()
        .map(|(i, ring)| normalize_ring(i, ring))
        .collect()
}

/// Ring 0 becomes the exterior, remaining rings are holes in given order.
pub fn normalize_polygon(raw: &[RawRing]) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = normalize_rings(raw)?;
    if rings.is_empty() {
        return Err(GeometryError::EmptyCoordinates);
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

/// Exact test: every point has zero cross product against the first edge
fn is_collinear(coords: &[Coord<f64>]) -> bool {
    let origin = coords[0];
    let Some(direction) = coords.iter().find(|c| **c != origin).map(|c| *c - origin) else {
        return true;
    };
    coords.iter().all(|c| {
        let offset = *c - origin;
        direction.x * offset.y - direction.y * offset.x == 0.0
    })
}

fn distinct_count(coords: &[Coord<f64>]) -> usize {
    // +0.0 folds negative zero into positive zero
    coords
        .iter()
        .map(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}
