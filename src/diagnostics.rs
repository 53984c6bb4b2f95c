//! Structured diagnostics for catalog construction and lookups.
//!
//! Builders and the resolver report what they dropped, repaired or matched
//! through a [`DiagnosticSink`] instead of logging inline.

use std::sync::Mutex;

use tracing::{debug, info, trace, warn};

use crate::error::{EntryError, GeometryError, GeometrySourceError};

/// One observable event.
#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// Geometry source missing or unreadable; catalog will be empty
    SourceUnavailable { error: &'a GeometrySourceError },
    /// A catalog entry was dropped
    EntryDropped { entry: usize, reason: &'a EntryError },
    /// One member polygon of a kept entry was left out
    PolygonSkipped {
        entry: usize,
        member: usize,
        reason: &'a GeometryError,
    },
    /// An invalid polygon was repaired before use
    PolygonRepaired { entry: usize, member: usize },
    /// Repair of an invalid polygon produced nothing; the polygon never matches
    RepairFailed { entry: usize, member: usize },
    /// Catalog construction finished
    CatalogBuilt {
        regions: usize,
        dropped: usize,
        skipped_polygons: usize,
        repaired_polygons: usize,
    },
    /// Lookup hit a catalog region
    RegionMatched {
        latitude: f64,
        longitude: f64,
        position: usize,
    },
    /// Lookup hit a fallback box
    FallbackMatched {
        latitude: f64,
        longitude: f64,
        name: &'a str,
    },
    Unmatched { latitude: f64, longitude: f64 },
    /// Lookup answered from the cache
    CacheHit { latitude: f64, longitude: f64 },
}

/// Receiver for [`Diagnostic`] events. Must be shareable across threads.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &Diagnostic<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &Diagnostic<'_>) {
        match event {
            Diagnostic::SourceUnavailable { error } => {
                warn!("Geometry source unavailable, using empty catalog: {}", error)
            }
            Diagnostic::EntryDropped { entry, reason } => {
                warn!("Dropping region entry {}: {}", entry, reason)
            }
            Diagnostic::PolygonSkipped {
                entry,
                member,
                reason,
            } => debug!("Skipping polygon {} of entry {}: {}", member, entry, reason),
            Diagnostic::PolygonRepaired { entry, member } => {
                debug!("Repaired invalid polygon {} of entry {}", member, entry)
            }
            Diagnostic::RepairFailed { entry, member } => {
                warn!("Could not repair polygon {} of entry {}", member, entry)
            }
            Diagnostic::CatalogBuilt {
                regions,
                dropped,
                skipped_polygons,
                repaired_polygons,
            } => info!(
                "Region catalog built: {} regions, {} dropped, {} polygons skipped, {} repaired",
                regions, dropped, skipped_polygons, repaired_polygons
            ),
            Diagnostic::RegionMatched {
                latitude,
                longitude,
                position,
            } => trace!("({}, {}) matched region #{}", latitude, longitude, position),
            Diagnostic::FallbackMatched {
                latitude,
                longitude,
                name,
            } => debug!("({}, {}) matched fallback box '{}'", latitude, longitude, name),
            Diagnostic::Unmatched {
                latitude,
                longitude,
            } => debug!("({}, {}) matched nothing", latitude, longitude),
            Diagnostic::CacheHit {
                latitude,
                longitude,
            } => trace!("({}, {}) served from cache", latitude, longitude),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &Diagnostic<'_>) {}
}

/// Keeps rendered events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered events recorded so far
    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.events().iter().filter(|e| e.contains(needle)).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: &Diagnostic<'_>) {
        let rendered = format!("{:?}", event);
        match self.events.lock() {
            Ok(mut events) => events.push(rendered),
            Err(poisoned) => poisoned.into_inner().push(rendered),
        }
    }
}
