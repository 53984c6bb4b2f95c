//! Micromarket - point-in-region lookup for latitude/longitude pairs
//!
//! This library provides the region catalog, resolver and batch runner
//! shared by the query and batch binaries.

pub mod batch;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fallback;
pub mod geometry;
pub mod models;
pub mod resolver;

pub use batch::{BatchOutput, BatchRunner, BatchSummary};
pub use catalog::{CatalogHandle, RegionCatalog};
pub use error::{EntryError, GeometryError, GeometrySourceError, LookupError, RowError};
pub use fallback::{BoundingBox, BoundingBoxFallback, NamedBox};
pub use models::{MatchResult, Region, RegionAttributes};
pub use resolver::RegionResolver;
