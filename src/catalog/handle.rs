//! Swappable reference to the live catalog.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use super::RegionCatalog;

/// Shared handle to the current catalog.
///
/// Readers take a snapshot and keep using it for the whole lookup, so a
/// concurrent [`CatalogHandle::replace`] is never observed half-way. Every
/// replace bumps a generation number, which lets caches tell results of
/// an older catalog apart.
pub struct CatalogHandle {
    current: RwLock<Versioned>,
}

struct Versioned {
    generation: u64,
    catalog: Arc<RegionCatalog>,
}

impl CatalogHandle {
    pub fn new(catalog: RegionCatalog) -> Self {
        Self {
            current: RwLock::new(Versioned {
                generation: 0,
                catalog: Arc::new(catalog),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Versioned> {
        match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current catalog
    pub fn snapshot(&self) -> Arc<RegionCatalog> {
        Arc::clone(&self.read().catalog)
    }

    /// Current catalog together with its generation, read under one lock
    pub fn current(&self) -> (u64, Arc<RegionCatalog>) {
        let guard = self.read();
        (guard.generation, Arc::clone(&guard.catalog))
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Install a freshly built catalog. Returns the new generation and the
    /// previous catalog.
    pub fn replace(&self, catalog: RegionCatalog) -> (u64, Arc<RegionCatalog>) {
        let next = Arc::new(catalog);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.generation += 1;
        let previous = std::mem::replace(&mut guard.catalog, next);
        (guard.generation, previous)
    }
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(RegionCatalog::empty())
    }
}
