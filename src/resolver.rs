//! Two-tier point resolution: catalog polygons first, bounding boxes second.

use std::sync::Arc;

use geo::Point;
use tracing::info;

use crate::cache::LookupCache;
use crate::catalog::{CatalogHandle, RegionCatalog};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::LookupError;
use crate::fallback::BoundingBoxFallback;
use crate::models::MatchResult;

/// City label appended to zone names
pub const DEFAULT_REGION_SUFFIX: &str = "Bangalore";

/// Reject latitudes outside [-90, 90] and longitudes outside [-180, 180].
/// NaN fails both ranges.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), LookupError> {
    if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(LookupError::OutOfRange {
            latitude,
            longitude,
        })
    }
}

/// Resolves points against a catalog with a bounding-box fallback.
///
/// All state is read-only during lookups (the optional cache has its own
/// lock), so one resolver can serve any number of threads.
pub struct RegionResolver {
    catalog: CatalogHandle,
    fallback: BoundingBoxFallback,
    region_suffix: String,
    cache: Option<Arc<LookupCache>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl RegionResolver {
    pub fn new(catalog: RegionCatalog, fallback: BoundingBoxFallback) -> Self {
        Self {
            catalog: CatalogHandle::new(catalog),
            fallback,
            region_suffix: DEFAULT_REGION_SUFFIX.to_string(),
            cache: None,
            sink: Arc::new(TracingSink),
        }
    }

    /// Suffix used for fallback zone names (`"{name} {suffix}"`)
    pub fn with_region_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.region_suffix = suffix.into();
        self
    }

    /// Consult and fill the given cache on every lookup
    pub fn with_cache(mut self, cache: Arc<LookupCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn region_suffix(&self) -> &str {
        &self.region_suffix
    }

    pub fn catalog(&self) -> Arc<RegionCatalog> {
        self.catalog.snapshot()
    }

    pub fn fallback(&self) -> &BoundingBoxFallback {
        &self.fallback
    }

    pub fn cache(&self) -> Option<&Arc<LookupCache>> {
        self.cache.as_ref()
    }

    /// Swap in a new catalog. Cached results from the old one are dropped,
    /// including ones written late by lookups that started before the swap.
    pub fn replace_catalog(&self, catalog: RegionCatalog) {
        let regions = catalog.len();
        let (generation, _previous) = self.catalog.replace(catalog);
        if let Some(cache) = &self.cache {
            cache.advance(generation);
        }
        info!("Region catalog replaced ({} regions, generation {})", regions, generation);
    }

    /// Resolve a point.
    ///
    /// Returns the first catalog region in load order containing the point,
    /// else the first fallback box containing it, else `Unmatched`.
    pub fn resolve(&self, latitude: f64, longitude: f64) -> Result<MatchResult, LookupError> {
        validate_coordinates(latitude, longitude)?;

        let (generation, catalog) = self.catalog.current();

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(generation, latitude, longitude) {
                self.sink.record(&Diagnostic::CacheHit {
                    latitude,
                    longitude,
                });
                return Ok(hit);
            }
        }

        let result = self.resolve_in(&catalog, latitude, longitude);

        if let Some(cache) = &self.cache {
            cache.insert(generation, latitude, longitude, result.clone());
        }
        Ok(result)
    }

    fn resolve_in(&self, catalog: &RegionCatalog, latitude: f64, longitude: f64) -> MatchResult {
        let point = Point::new(longitude, latitude);

        if let Some(region) = catalog.find(&point) {
            self.sink.record(&Diagnostic::RegionMatched {
                latitude,
                longitude,
                position: region.position,
            });
            let attrs = &region.attributes;
            return MatchResult::Matched {
                area: attrs.area_or_empty().to_string(),
                micromarket: attrs.micromarket_or_empty().to_string(),
                zone: attrs.zone_or_empty().to_string(),
            };
        }

        if let Some(named) = self.fallback.find(longitude, latitude) {
            self.sink.record(&Diagnostic::FallbackMatched {
                latitude,
                longitude,
                name: &named.name,
            });
            return MatchResult::FallbackMatched {
                area: named.name.clone(),
                micromarket: named.name.clone(),
                zone: format!("{} {}", named.name, self.region_suffix),
            };
        }

        self.sink.record(&Diagnostic::Unmatched {
            latitude,
            longitude,
        });
        MatchResult::Unmatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemorySink, NullSink};
    use crate::fallback::default_boxes;
    use crate::models::{RawGeometry, RawRegion, RawRing, RegionAttributes};

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> RawRing {
        vec![
            vec![min_x, min_y],
            vec![max_x, min_y],
            vec![max_x, max_y],
            vec![min_x, max_y],
        ]
    }

    fn region(area: &str, micromarket: &str, zone: &str, rings: Vec<RawRing>) -> RawRegion {
        RawRegion::new(
            RawGeometry::Polygon(rings),
            RegionAttributes::new(Some(area), Some(micromarket), Some(zone)),
        )
    }

    /// Two overlapping squares north of the fallback boxes, one with a hole
    fn sample_resolver() -> RegionResolver {
        let catalog = RegionCatalog::build(
            vec![
                region(
                    "Whitefield",
                    "East",
                    "Mahadevapura",
                    vec![rect(77.70, 12.95, 77.80, 13.00), rect(77.74, 12.97, 77.76, 12.98)],
                ),
                region("Brookefield", "East", "", vec![rect(77.72, 12.96, 77.78, 12.99)]),
                region("Hoodi", "", "", vec![rect(77.71, 12.99, 77.72, 13.10)]),
            ],
            &NullSink,
        );
        RegionResolver::new(catalog, BoundingBoxFallback::new(default_boxes()))
            .with_sink(Arc::new(NullSink))
    }

    #[test]
    fn test_interior_point_matches() {
        let resolver = sample_resolver();
        assert_eq!(
            resolver.resolve(12.96, 77.71).unwrap(),
            MatchResult::Matched {
                area: "Whitefield".to_string(),
                micromarket: "East".to_string(),
                zone: "Mahadevapura".to_string(),
            }
        );
    }

    #[test]
    fn test_first_loaded_region_wins_overlap() {
        let resolver = sample_resolver();
        let result = resolver.resolve(12.965, 77.73).unwrap();
        assert_eq!(result.area(), Some("Whitefield"));
    }

    #[test]
    fn test_hole_defers_to_lower_priority_region() {
        let resolver = sample_resolver();
        let result = resolver.resolve(12.975, 77.75).unwrap();
        assert_eq!(
            result,
            MatchResult::Matched {
                area: "Brookefield".to_string(),
                micromarket: "East".to_string(),
                zone: String::new(),
            }
        );
    }

    #[test]
    fn test_missing_attributes_become_empty_strings() {
        let resolver = sample_resolver();
        assert_eq!(
            resolver.resolve(13.05, 77.715).unwrap(),
            MatchResult::Matched {
                area: "Hoodi".to_string(),
                micromarket: String::new(),
                zone: String::new(),
            }
        );
    }

    #[test]
    fn test_fallback_box() {
        let resolver = sample_resolver();
        assert_eq!(
            resolver.resolve(12.91, 77.61).unwrap(),
            MatchResult::FallbackMatched {
                area: "BTM Layout".to_string(),
                micromarket: "BTM Layout".to_string(),
                zone: "BTM Layout Bangalore".to_string(),
            }
        );
    }

    #[test]
    fn test_custom_suffix() {
        let resolver = sample_resolver().with_region_suffix("Bengaluru");
        let result = resolver.resolve(13.05, 77.60).unwrap();
        assert_eq!(result.zone_label("ignored"), "Hebbal Bengaluru");
    }

    #[test]
    fn test_unmatched() {
        let resolver = sample_resolver();
        assert_eq!(resolver.resolve(28.61, 77.20).unwrap(), MatchResult::Unmatched);
    }

    #[test]
    fn test_out_of_range_rejected_before_lookup() {
        let sink = Arc::new(MemorySink::new());
        let resolver = sample_resolver().with_sink(sink.clone());

        assert_eq!(
            resolver.resolve(91.0, 0.0),
            Err(LookupError::OutOfRange {
                latitude: 91.0,
                longitude: 0.0
            })
        );
        assert!(resolver.resolve(0.0, -180.5).is_err());
        assert!(resolver.resolve(f64::NAN, 0.0).is_err());
        assert!(sink.events().is_empty());

        assert!(resolver.resolve(90.0, 180.0).is_ok());
    }

    #[test]
    fn test_empty_catalog_never_errors() {
        let resolver = RegionResolver::new(
            RegionCatalog::from_geojson_str("garbage", &NullSink),
            BoundingBoxFallback::new(default_boxes()),
        )
        .with_sink(Arc::new(NullSink));

        assert_eq!(resolver.resolve(12.96, 77.71).unwrap(), MatchResult::Unmatched);
        assert!(matches!(
            resolver.resolve(12.91, 77.61).unwrap(),
            MatchResult::FallbackMatched { .. }
        ));
    }

    #[test]
    fn test_cache_is_consulted_and_cleared_on_replace() {
        let cache = Arc::new(LookupCache::new(16));
        let resolver = sample_resolver().with_cache(Arc::clone(&cache));

        let first = resolver.resolve(12.96, 77.71).unwrap();
        let second = resolver.resolve(12.96, 77.71).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);

        resolver.replace_catalog(RegionCatalog::empty());
        assert!(cache.is_empty());
        assert_eq!(resolver.resolve(12.96, 77.71).unwrap(), MatchResult::Unmatched);
    }

    #[test]
    fn test_late_insert_from_old_catalog_is_not_served() {
        let cache = Arc::new(LookupCache::new(16));
        let resolver = sample_resolver().with_cache(Arc::clone(&cache));

        // A lookup takes its snapshot, then the catalog is swapped before
        // the lookup gets to write its result
        let (generation, old) = resolver.catalog.current();
        let stale = resolver.resolve_in(&old, 12.96, 77.71);
        assert_eq!(stale.area(), Some("Whitefield"));

        resolver.replace_catalog(RegionCatalog::empty());
        cache.insert(generation, 12.96, 77.71, stale);

        assert!(cache.is_empty());
        assert_eq!(resolver.resolve(12.96, 77.71).unwrap(), MatchResult::Unmatched);
        assert_eq!(resolver.resolve(12.96, 77.71).unwrap(), MatchResult::Unmatched);
    }

    #[test]
    fn test_cache_does_not_change_results() {
        let cached = sample_resolver().with_cache(Arc::new(LookupCache::new(2)));
        let plain = sample_resolver();
        for (lat, lon) in [(12.96, 77.71), (12.975, 77.75), (12.91, 77.61), (0.0, 0.0), (12.96, 77.71)] {
            assert_eq!(cached.resolve(lat, lon), plain.resolve(lat, lon));
        }
    }

    #[test]
    fn test_resolver_shared_across_threads() {
        let resolver = Arc::new(sample_resolver());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || resolver.resolve(12.96, 77.71).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().area(), Some("Whitefield"));
        }
    }
}
