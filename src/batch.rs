//! Row-oriented lookups.
//!
//! Every input record yields exactly one output, in input order. A row
//! with missing or unparsable coordinates gets a [`RowError`]; the rest of
//! the batch is unaffected.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::RowError;
use crate::models::MatchResult;
use crate::resolver::RegionResolver;

/// Parse one coordinate field. Blank or absent values count as missing;
/// `NaN` and infinities count as unparsable.
pub fn parse_coordinate(field: &'static str, raw: Option<&str>) -> Result<f64, RowError> {
    let value = raw.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(RowError::MissingCoordinate { field });
    }
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(RowError::UnparsableCoordinate {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse a combined `"lat,lon"` field
pub fn parse_coordinate_pair(raw: Option<&str>) -> Result<(f64, f64), RowError> {
    let value = raw.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(RowError::MissingCoordinate {
            field: "coordinates",
        });
    }

    let mut parts = value.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(lon), None) => Ok((
            parse_coordinate("latitude", Some(lat))?,
            parse_coordinate("longitude", Some(lon))?,
        )),
        _ => Err(RowError::UnparsableCoordinate {
            field: "coordinates",
            value: value.to_string(),
        }),
    }
}

/// One processed record
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput<R> {
    /// Position of the record in the input
    pub index: usize,
    pub record: R,
    pub outcome: Result<MatchResult, RowError>,
}

/// Outcome counts over a processed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub matched: usize,
    pub fallback: usize,
    pub unmatched: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &Result<MatchResult, RowError>) {
        self.rows += 1;
        match outcome {
            Ok(MatchResult::Matched { .. }) => self.matched += 1,
            Ok(MatchResult::FallbackMatched { .. }) => self.fallback += 1,
            Ok(MatchResult::Unmatched) => self.unmatched += 1,
            Err(_) => self.errors += 1,
        }
    }

    pub fn from_outputs<R>(outputs: &[BatchOutput<R>]) -> Self {
        let mut summary = Self::default();
        for output in outputs {
            summary.record(&output.outcome);
        }
        summary
    }
}

/// Applies a [`RegionResolver`] to a sequence of records.
pub struct BatchRunner<'a> {
    resolver: &'a RegionResolver,
}

impl<'a> BatchRunner<'a> {
    pub fn new(resolver: &'a RegionResolver) -> Self {
        Self { resolver }
    }

    /// Lazily resolve records one after another.
    pub fn run<R, I, Lat, Lon>(
        &self,
        records: I,
        latitude_of: Lat,
        longitude_of: Lon,
    ) -> impl Iterator<Item = BatchOutput<R>> + 'a
    where
        I: IntoIterator<Item = R>,
        I::IntoIter: 'a,
        R: 'a,
        Lat: Fn(&R) -> Result<f64, RowError> + 'a,
        Lon: Fn(&R) -> Result<f64, RowError> + 'a,
    {
        let resolver = self.resolver;
        records
            .into_iter()
            .enumerate()
            .map(move |(index, record)| {
                let outcome = resolve_record(resolver, &record, &latitude_of, &longitude_of);
                BatchOutput {
                    index,
                    record,
                    outcome,
                }
            })
    }

    /// Resolve records on the rayon pool. Output order matches input order.
    pub fn run_parallel<R, Lat, Lon>(
        &self,
        records: Vec<R>,
        latitude_of: Lat,
        longitude_of: Lon,
    ) -> Vec<BatchOutput<R>>
    where
        R: Send,
        Lat: Fn(&R) -> Result<f64, RowError> + Sync,
        Lon: Fn(&R) -> Result<f64, RowError> + Sync,
    {
        let resolver = self.resolver;
        records
            .into_par_iter()
            .enumerate()
            .map(|(index, record)| {
                let outcome = resolve_record(resolver, &record, &latitude_of, &longitude_of);
                BatchOutput {
                    index,
                    record,
                    outcome,
                }
            })
            .collect()
    }
}

fn resolve_record<R, Lat, Lon>(
    resolver: &RegionResolver,
    record: &R,
    latitude_of: &Lat,
    longitude_of: &Lon,
) -> Result<MatchResult, RowError>
where
    Lat: Fn(&R) -> Result<f64, RowError>,
    Lon: Fn(&R) -> Result<f64, RowError>,
{
    let latitude = latitude_of(record)?;
    let longitude = longitude_of(record)?;
    Ok(resolver.resolve(latitude, longitude)?)
}
