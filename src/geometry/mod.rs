//! Geometry preparation and containment.
//!
//! Raw rings are normalized to 2D, validated (and repaired when invalid)
//! once while the catalog is built. Lookups then only run [`contains`].

mod contains;
mod normalize;
mod repair;

use geo::{Geometry, MultiPolygon};

pub use contains::{contains, multi_polygon_contains, polygon_contains};
pub use normalize::{normalize_polygon, normalize_ring, normalize_rings};
pub use repair::{check_polygon, repair_polygon, Checked};

use crate::error::{EntryError, GeometryError};
use crate::models::RawGeometry;

/// A member polygon that was left out of its region
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPolygon {
    pub member: usize,
    pub reason: GeometryError,
}

/// Output of [`prepare_geometry`]
#[derive(Debug, Clone)]
pub struct PreparedGeometry {
    pub geometry: Geometry<f64>,
    /// Members rejected by normalization or failed repair
    pub skipped: Vec<SkippedPolygon>,
    /// Indices of members that had to be repaired
    pub repaired: Vec<usize>,
}

impl PreparedGeometry {
    fn single(geometry: Geometry<f64>, repaired: bool) -> Self {
        Self {
            geometry,
            skipped: Vec::new(),
            repaired: if repaired { vec![0] } else { Vec::new() },
        }
    }
}

/// Turn a raw payload into a geometry usable by [`contains`].
///
/// A simple polygon either survives whole or fails the entry. For a
/// multi-polygon, bad members are skipped and the entry only fails when no
/// member is left.
pub fn prepare_geometry(raw: &RawGeometry) -> Result<PreparedGeometry, EntryError> {
    match raw {
        RawGeometry::Unsupported(name) => Err(GeometryError::UnsupportedType(name.clone()).into()),
        RawGeometry::Polygon(rings) => {
            let polygon = normalize_polygon(rings)?;
            let prepared = match check_polygon(polygon)? {
                Checked::Valid(polygon) => {
                    PreparedGeometry::single(Geometry::Polygon(polygon), false)
                }
                Checked::Repaired(mut multi) if multi.0.len() == 1 => {
                    let polygon = multi.0.remove(0);
                    PreparedGeometry::single(Geometry::Polygon(polygon), true)
                }
                Checked::Repaired(multi) => {
                    PreparedGeometry::single(Geometry::MultiPolygon(multi), true)
                }
            };
            Ok(prepared)
        }
        RawGeometry::MultiPolygon(members) => {
            if members.is_empty() {
                return Err(GeometryError::EmptyCoordinates.into());
            }

            let mut parts = Vec::with_capacity(members.len());
            let mut skipped = Vec::new();
            let mut repaired = Vec::new();

            for (member, rings) in members.iter().enumerate() {
                match normalize_polygon(rings).and_then(check_polygon) {
                    Ok(checked) => {
                        if checked.is_repaired() {
                            repaired.push(member);
                        }
                        checked.push_into(&mut parts);
                    }
                    Err(reason) => skipped.push(SkippedPolygon { member, reason }),
                }
            }

            if parts.is_empty() {
                return Err(EntryError::NoUsablePolygon {
                    skipped: skipped.len(),
                });
            }

            Ok(PreparedGeometry {
                geometry: Geometry::MultiPolygon(MultiPolygon::new(parts)),
                skipped,
                repaired,
            })
        }
    }
}
