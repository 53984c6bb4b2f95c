use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::LookupCache;
use crate::catalog::RegionCatalog;
use crate::diagnostics::DiagnosticSink;
use crate::fallback::{default_boxes, BoundingBoxFallback, NamedBox};
use crate::resolver::{RegionResolver, DEFAULT_REGION_SUFFIX};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub resolver: ResolverConfig,
    /// Fallback boxes in priority order; built-in boxes when absent
    pub fallback: Option<Vec<NamedBox>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/micromarkets.geojson"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    pub region_suffix: String,
    /// 0 disables the lookup cache
    pub cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            region_suffix: DEFAULT_REGION_SUFFIX.to_string(),
            cache_capacity: 0,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn fallback_boxes(&self) -> Vec<NamedBox> {
        self.fallback.clone().unwrap_or_else(default_boxes)
    }

    /// Load the catalog and assemble a resolver from this configuration
    pub fn build_resolver(&self, sink: Arc<dyn DiagnosticSink>) -> RegionResolver {
        let catalog = RegionCatalog::from_path(&self.catalog.path, sink.as_ref());
        let mut resolver = RegionResolver::new(catalog, BoundingBoxFallback::new(self.fallback_boxes()))
            .with_region_suffix(self.resolver.region_suffix.clone())
            .with_sink(sink);

        if self.resolver.cache_capacity > 0 {
            resolver = resolver.with_cache(Arc::new(LookupCache::new(self.resolver.cache_capacity)));
        }
        resolver
    }
}
