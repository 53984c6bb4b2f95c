//! Error types for catalog construction, lookups and batch rows.
//!
//! None of these terminate a lookup or a batch: source and entry errors are
//! recovered while the catalog is built, `LookupError` goes back to the
//! immediate caller and `RowError` stays attached to its row.

use std::path::PathBuf;

use thiserror::Error;

/// The geometry source could not be read at catalog-build time.
#[derive(Debug, Error)]
pub enum GeometrySourceError {
    /// Source file missing or unreadable
    #[error("Failed to read geometry source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source is not valid JSON
    #[error("Failed to parse geometry source: {0}")]
    Parse(#[from] serde_json::Error),

    /// Top-level object has no `features` array
    #[error("Geometry source has no feature list")]
    MissingFeatures,
}

/// A ring or polygon that cannot take part in containment tests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Unsupported geometry type '{0}'")]
    UnsupportedType(String),

    #[error("Empty coordinate array")]
    EmptyCoordinates,

    #[error("Could not decode coordinates: {0}")]
    Unparsable(String),

    /// A position with fewer than two numeric components
    #[error("Ring {ring} point {point} has {components} component(s), need at least 2")]
    ShortPosition {
        ring: usize,
        point: usize,
        components: usize,
    },

    #[error("Ring {ring} point {point} is not a finite coordinate")]
    NonFinitePosition { ring: usize, point: usize },

    /// Fewer than three distinct points after dropping the closing point
    #[error("Ring {ring} is degenerate ({distinct} distinct point(s))")]
    DegenerateRing { ring: usize, distinct: usize },

    /// All points on one line, so the ring encloses no area
    #[error("Ring {ring} is collinear")]
    CollinearRing { ring: usize },

    #[error("Invalid polygon could not be repaired")]
    RepairFailed,
}

/// A single catalog entry that was dropped during construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryError {
    /// Area, micromarket and zone are all empty
    #[error("Region has no usable display attribute")]
    MissingAttributes,

    /// Feature could not be decoded at all
    #[error("Malformed feature: {0}")]
    Malformed(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Every member polygon was rejected
    #[error("No usable polygon ({skipped} skipped)")]
    NoUsablePolygon { skipped: usize },
}

/// A query coordinate the resolver refuses to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LookupError {
    #[error("Coordinate out of range (lat={latitude}, lon={longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Per-row failure in batch mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("Missing {field} value")]
    MissingCoordinate { field: &'static str },

    #[error("Unparsable {field} value '{value}'")]
    UnparsableCoordinate { field: &'static str, value: String },

    #[error(transparent)]
    OutOfRange(#[from] LookupError),
}

impl RowError {
    /// Short label written into augmented output rows
    pub fn label(&self) -> &'static str {
        match self {
            RowError::MissingCoordinate { .. } => "No Coordinates",
            RowError::UnparsableCoordinate { .. } => "Invalid Coordinates",
            RowError::OutOfRange(_) => "Out Of Range",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_labels() {
        let missing = RowError::MissingCoordinate { field: "latitude" };
        assert_eq!(missing.label(), "No Coordinates");

        let bad = RowError::UnparsableCoordinate {
            field: "longitude",
            value: "abc".to_string(),
        };
        assert_eq!(bad.label(), "Invalid Coordinates");
        assert_eq!(bad.to_string(), "Unparsable longitude value 'abc'");

        let range: RowError = LookupError::OutOfRange {
            latitude: 91.0,
            longitude: 0.0,
        }
        .into();
        assert_eq!(range.label(), "Out Of Range");
    }

    #[test]
    fn test_entry_error_wraps_geometry_error() {
        let err: EntryError = GeometryError::UnsupportedType("Point".to_string()).into();
        assert_eq!(err.to_string(), "Unsupported geometry type 'Point'");
    }
}
