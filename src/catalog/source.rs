//! GeoJSON FeatureCollection adapter for catalog construction.
//!
//! Features are decoded one by one so a single malformed feature only
//! drops that entry. Whole-source failures (missing file, invalid JSON, no
//! `features` array) are reported as [`GeometrySourceError`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::RegionCatalog;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{EntryError, GeometrySourceError};
use crate::models::{RawGeometry, RawRegion, RawRing, RegionAttributes};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<GeometryObject>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct GeometryObject {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl GeometryObject {
    fn into_raw(self) -> Result<RawGeometry, EntryError> {
        match self.kind.as_str() {
            "Polygon" => serde_json::from_value::<Vec<RawRing>>(self.coordinates)
                .map(RawGeometry::Polygon)
                .map_err(|e| EntryError::Malformed(e.to_string())),
            "MultiPolygon" => {
                let members = match self.coordinates {
                    Value::Array(members) => members,
                    other => {
                        return Err(EntryError::Malformed(format!(
                            "MultiPolygon coordinates must be an array, got {}",
                            json_kind(&other)
                        )))
                    }
                };
                // An undecodable member becomes an empty polygon, which the
                // normalizer rejects on its own without failing the siblings.
                let polygons = members
                    .into_iter()
                    .map(|member| serde_json::from_value::<Vec<RawRing>>(member).unwrap_or_default())
                    .collect();
                Ok(RawGeometry::MultiPolygon(polygons))
            }
            other => Ok(RawGeometry::Unsupported(other.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_feature(value: Value) -> Result<RawRegion, EntryError> {
    let feature: Feature =
        serde_json::from_value(value).map_err(|e| EntryError::Malformed(e.to_string()))?;

    let geometry = feature
        .geometry
        .ok_or_else(|| EntryError::Malformed("feature has no geometry".to_string()))?
        .into_raw()?;
    let attributes = feature
        .properties
        .as_ref()
        .map(RegionAttributes::from_properties)
        .unwrap_or_default();

    Ok(RawRegion::new(geometry, attributes))
}

/// Decode a FeatureCollection into per-feature results, in document order.
pub fn parse_feature_collection(
    text: &str,
) -> Result<Vec<Result<RawRegion, EntryError>>, GeometrySourceError> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    let features = collection
        .features
        .ok_or(GeometrySourceError::MissingFeatures)?;
    Ok(features.into_iter().map(decode_feature).collect())
}

/// Read a FeatureCollection from disk. `.gz` files are decompressed.
pub fn read_feature_collection(
    path: &Path,
) -> Result<Vec<Result<RawRegion, EntryError>>, GeometrySourceError> {
    let io_error = |source| GeometrySourceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(io_error)?;
    parse_feature_collection(&text)
}

impl RegionCatalog {
    /// Build a catalog from a GeoJSON string. A broken source yields an
    /// empty catalog.
    pub fn from_geojson_str(text: &str, sink: &dyn DiagnosticSink) -> Self {
        match parse_feature_collection(text) {
            Ok(entries) => Self::from_entries(entries, sink),
            Err(error) => {
                sink.record(&Diagnostic::SourceUnavailable { error: &error });
                Self::empty()
            }
        }
    }

    /// Build a catalog from a GeoJSON file. A missing or broken file yields
    /// an empty catalog.
    pub fn from_path(path: &Path, sink: &dyn DiagnosticSink) -> Self {
        info!("Loading region geometry from {}", path.display());
        match read_feature_collection(path) {
            Ok(entries) => Self::from_entries(entries, sink),
            Err(error) => {
                sink.record(&Diagnostic::SourceUnavailable { error: &error });
                Self::empty()
            }
        }
    }
}
