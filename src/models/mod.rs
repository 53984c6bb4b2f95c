//! Core data models for the region lookup engine.

pub mod raw;
pub mod region;
pub mod result;

pub use raw::{RawGeometry, RawPosition, RawRegion, RawRing};
pub use region::{Region, RegionAttributes};
pub use result::MatchResult;
