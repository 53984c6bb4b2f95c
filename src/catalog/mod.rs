//! Region catalog: construction, ordered iteration and lookup.
//!
//! Built once from a geometry source and shared read-only afterwards.
//! Refreshing data means building a new catalog and swapping it in
//! through a [`CatalogHandle`].

mod handle;
mod index;
pub mod source;
mod store;

pub use handle::CatalogHandle;
pub use source::{parse_feature_collection, read_feature_collection};
pub use store::{CatalogStats, RegionCatalog};
