//! Immutable, ordered region catalog.

use geo::Point;
use serde::Serialize;

use super::index::{EnvelopeIndex, IndexedRegion};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{EntryError, GeometryError};
use crate::geometry::prepare_geometry;
use crate::models::{RawRegion, Region};

/// Counters collected while the catalog was built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub regions: usize,
    pub dropped: usize,
    pub skipped_polygons: usize,
    pub repaired_polygons: usize,
}

/// Regions in load order. Built once, never mutated.
///
/// Load order is the only precedence rule: when several regions contain a
/// point, the one loaded first wins.
pub struct RegionCatalog {
    regions: Vec<Region>,
    index: EnvelopeIndex,
    stats: CatalogStats,
}

impl RegionCatalog {
    /// Catalog without regions; every lookup misses
    pub fn empty() -> Self {
        Self {
            regions: Vec::new(),
            index: EnvelopeIndex::build(Vec::new()),
            stats: CatalogStats::default(),
        }
    }

    /// Build from `(geometry, attributes)` entries.
    ///
    /// Entries without any display attribute or without a usable polygon
    /// are dropped and counted; construction itself never fails.
    pub fn build<I>(entries: I, sink: &dyn DiagnosticSink) -> Self
    where
        I: IntoIterator<Item = RawRegion>,
    {
        Self::from_entries(entries.into_iter().map(Ok), sink)
    }

    /// Like [`RegionCatalog::build`], but entries that already failed to
    /// decode are passed through so they are counted as dropped.
    pub(crate) fn from_entries<I>(entries: I, sink: &dyn DiagnosticSink) -> Self
    where
        I: IntoIterator<Item = Result<RawRegion, EntryError>>,
    {
        let mut regions: Vec<Region> = Vec::new();
        let mut stats = CatalogStats::default();

        for (entry, decoded) in entries.into_iter().enumerate() {
            let raw = match decoded {
                Ok(raw) => raw,
                Err(reason) => {
                    sink.record(&Diagnostic::EntryDropped {
                        entry,
                        reason: &reason,
                    });
                    stats.dropped += 1;
                    continue;
                }
            };

            // Nothing to report for a region without names
            if raw.attributes.is_empty() {
                sink.record(&Diagnostic::EntryDropped {
                    entry,
                    reason: &EntryError::MissingAttributes,
                });
                stats.dropped += 1;
                continue;
            }

            let prepared = match prepare_geometry(&raw.geometry) {
                Ok(prepared) => prepared,
                Err(reason) => {
                    if reason == EntryError::Geometry(GeometryError::RepairFailed) {
                        sink.record(&Diagnostic::RepairFailed { entry, member: 0 });
                    }
                    sink.record(&Diagnostic::EntryDropped {
                        entry,
                        reason: &reason,
                    });
                    stats.dropped += 1;
                    continue;
                }
            };

            for skipped in &prepared.skipped {
                if skipped.reason == GeometryError::RepairFailed {
                    sink.record(&Diagnostic::RepairFailed {
                        entry,
                        member: skipped.member,
                    });
                }
                sink.record(&Diagnostic::PolygonSkipped {
                    entry,
                    member: skipped.member,
                    reason: &skipped.reason,
                });
            }
            for member in &prepared.repaired {
                sink.record(&Diagnostic::PolygonRepaired {
                    entry,
                    member: *member,
                });
            }
            stats.skipped_polygons += prepared.skipped.len();
            stats.repaired_polygons += prepared.repaired.len();

            let position = regions.len();
            regions.push(Region::new(position, raw.attributes, prepared.geometry));
        }

        let indexed: Vec<IndexedRegion> = regions
            .iter()
            .filter_map(|region| region.bbox().map(|rect| IndexedRegion::new(region.position, rect)))
            .collect();
        let index = EnvelopeIndex::build(indexed);

        stats.regions = regions.len();
        sink.record(&Diagnostic::CatalogBuilt {
            regions: stats.regions,
            dropped: stats.dropped,
            skipped_polygons: stats.skipped_polygons,
            repaired_polygons: stats.repaired_polygons,
        });

        Self {
            regions,
            index,
            stats,
        }
    }

    /// Regions in load order
    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Region> {
        self.regions.get(position)
    }

    /// First region in load order containing the point.
    ///
    /// Uses the envelope index to skip regions that cannot match; the
    /// remaining candidates are tested in load order and the scan stops at
    /// the first hit.
    pub fn find(&self, point: &Point<f64>) -> Option<&Region> {
        self.index
            .candidates(point.x(), point.y())
            .into_iter()
            .filter_map(|position| self.regions.get(position))
            .find(|region| region.contains(point))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of entries dropped during construction
    pub fn dropped(&self) -> usize {
        self.stats.dropped
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    /// Number of regions present in the envelope index
    pub fn indexed(&self) -> usize {
        self.index.len()
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemorySink, NullSink};
    use crate::models::{RawGeometry, RawRing, RegionAttributes};

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> RawRing {
        vec![
            vec![min_x, min_y],
            vec![max_x, min_y],
            vec![max_x, max_y],
            vec![min_x, max_y],
        ]
    }

    fn named(name: &str, geometry: RawGeometry) -> RawRegion {
        RawRegion::new(geometry, RegionAttributes::new(Some(name), None, None))
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = RegionCatalog::empty();
        assert!(catalog.is_empty());
        assert_eq!(catalog.dropped(), 0);
        assert!(catalog.find(&Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_load_order_preserved() {
        let catalog = RegionCatalog::build(
            vec![
                named("a", RawGeometry::Polygon(vec![rect(0.0, 0.0, 1.0, 1.0)])),
                named("b", RawGeometry::Polygon(vec![rect(2.0, 2.0, 3.0, 3.0)])),
                named("c", RawGeometry::Polygon(vec![rect(4.0, 4.0, 5.0, 5.0)])),
            ],
            &NullSink,
        );

        let names: Vec<&str> = catalog.iter().map(|r| r.attributes.area_or_empty()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let positions: Vec<usize> = catalog.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(catalog.indexed(), 3);
    }

    #[test]
    fn test_first_loaded_region_wins() {
        let catalog = RegionCatalog::build(
            vec![
                named("small", RawGeometry::Polygon(vec![rect(4.0, 4.0, 6.0, 6.0)])),
                named("big", RawGeometry::Polygon(vec![rect(0.0, 0.0, 10.0, 10.0)])),
            ],
            &NullSink,
        );
        let hit = catalog.find(&Point::new(5.0, 5.0)).unwrap();
        assert_eq!(hit.attributes.area_or_empty(), "small");

        let reversed = RegionCatalog::build(
            vec![
                named("big", RawGeometry::Polygon(vec![rect(0.0, 0.0, 10.0, 10.0)])),
                named("small", RawGeometry::Polygon(vec![rect(4.0, 4.0, 6.0, 6.0)])),
            ],
            &NullSink,
        );
        let hit = reversed.find(&Point::new(5.0, 5.0)).unwrap();
        assert_eq!(hit.attributes.area_or_empty(), "big");
    }

    #[test]
    fn test_invalid_entries_dropped_and_counted() {
        let sink = MemorySink::new();
        let catalog = RegionCatalog::build(
            vec![
                named("point", RawGeometry::Unsupported("Point".to_string())),
                named("empty", RawGeometry::Polygon(vec![])),
                RawRegion::new(
                    RawGeometry::Polygon(vec![rect(0.0, 0.0, 1.0, 1.0)]),
                    RegionAttributes::default(),
                ),
                named("ok", RawGeometry::Polygon(vec![rect(0.0, 0.0, 1.0, 1.0)])),
            ],
            &sink,
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.dropped(), 3);
        assert_eq!(catalog.get(0).unwrap().attributes.area_or_empty(), "ok");
        assert_eq!(sink.count_matching("EntryDropped"), 3);
        assert_eq!(sink.count_matching("CatalogBuilt"), 1);
    }

    /// Out to (1, 1) and straight back along the same edges
    fn spike() -> RawRing {
        vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 0.0]]
    }

    #[test]
    fn test_unrepairable_polygon_drops_entry() {
        let sink = MemorySink::new();
        let catalog = RegionCatalog::build(
            vec![
                named("spike", RawGeometry::Polygon(vec![spike()])),
                named("ok", RawGeometry::Polygon(vec![rect(0.0, 0.0, 1.0, 1.0)])),
            ],
            &sink,
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.dropped(), 1);
        assert_eq!(sink.count_matching("RepairFailed {"), 1);
        assert_eq!(sink.count_matching("EntryDropped"), 1);
        assert_eq!(catalog.find(&Point::new(0.5, 0.5)).unwrap().attributes.area_or_empty(), "ok");
    }

    #[test]
    fn test_unrepairable_member_skipped_in_multi_polygon() {
        let sink = MemorySink::new();
        let multi = RawGeometry::MultiPolygon(vec![vec![spike()], vec![rect(5.0, 5.0, 6.0, 6.0)]]);
        let catalog = RegionCatalog::build(vec![named("multi", multi)], &sink);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.dropped(), 0);
        assert_eq!(catalog.stats().skipped_polygons, 1);
        assert_eq!(sink.count_matching("RepairFailed { entry: 0, member: 0 }"), 1);
        assert_eq!(sink.count_matching("PolygonSkipped"), 1);
        assert!(catalog.find(&Point::new(5.5, 5.5)).is_some());
        assert!(catalog.find(&Point::new(0.5, 0.5)).is_none());
    }

    #[test]
    fn test_collinear_ring_counted_as_dropped() {
        let line = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let catalog = RegionCatalog::build(vec![named("line", RawGeometry::Polygon(vec![line]))], &NullSink);
        assert!(catalog.is_empty());
        assert_eq!(catalog.dropped(), 1);
    }

    #[test]
    fn test_hole_point_falls_through_to_next_region() {
        let with_hole = RawGeometry::Polygon(vec![
            rect(0.0, 0.0, 10.0, 10.0),
            rect(4.0, 4.0, 6.0, 6.0),
        ]);
        let catalog = RegionCatalog::build(
            vec![
                named("donut", with_hole),
                named("filler", RawGeometry::Polygon(vec![rect(3.0, 3.0, 7.0, 7.0)])),
            ],
            &NullSink,
        );

        let hit = catalog.find(&Point::new(5.0, 5.0)).unwrap();
        assert_eq!(hit.attributes.area_or_empty(), "filler");
        let hit = catalog.find(&Point::new(1.0, 1.0)).unwrap();
        assert_eq!(hit.attributes.area_or_empty(), "donut");
    }

    #[test]
    fn test_indexed_find_agrees_with_scan() {
        let mut entries = Vec::new();
        for i in 0..20 {
            let offset = i as f64 * 0.5;
            entries.push(named(
                &format!("r{}", i),
                RawGeometry::Polygon(vec![rect(offset, offset, offset + 3.0, offset + 3.0)]),
            ));
        }
        let catalog = RegionCatalog::build(entries, &NullSink);

        for step in 0..60 {
            let v = step as f64 * 0.23;
            let point = Point::new(v, v + 0.1);
            let scanned = catalog.iter().find(|r| r.contains(&point)).map(|r| r.position);
            let indexed = catalog.find(&point).map(|r| r.position);
            assert_eq!(scanned, indexed, "mismatch at {:?}", point);
        }
    }

    #[test]
    fn test_repair_and_skip_reported() {
        let sink = MemorySink::new();
        let bowtie = vec![vec![0.0, 0.0], vec![2.0, 2.0], vec![2.0, 0.0], vec![0.0, 2.0]];
        let catalog = RegionCatalog::build(
            vec![named(
                "multi",
                RawGeometry::MultiPolygon(vec![
                    vec![bowtie],
                    vec![vec![vec![9.0, 9.0]]],
                    vec![rect(5.0, 5.0, 6.0, 6.0)],
                ]),
            )],
            &sink,
        );

        let stats = catalog.stats();
        assert_eq!(stats.regions, 1);
        assert_eq!(stats.repaired_polygons, 1);
        assert_eq!(stats.skipped_polygons, 1);
        assert_eq!(sink.count_matching("PolygonRepaired"), 1);
        assert_eq!(sink.count_matching("PolygonSkipped"), 1);
        assert!(catalog.find(&Point::new(5.5, 5.5)).is_some());
    }
}
