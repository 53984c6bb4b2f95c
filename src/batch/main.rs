//! Batch CSV enrichment.
//!
//! Reads a CSV of coordinates, resolves every data row and writes the rows
//! back out with `Micromarket` and `Area` columns appended.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use micromarket::batch::{parse_coordinate, parse_coordinate_pair, BatchRunner, BatchSummary};
use micromarket::config::Config;
use micromarket::diagnostics::TracingSink;
use micromarket::{MatchResult, RowError};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "batch")]
#[command(about = "Append micromarket columns to a CSV of coordinates")]
struct Args {
    /// Input CSV file (first row is the header)
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region geometry file, overrides the configured catalog path
    #[arg(short, long)]
    geometry: Option<PathBuf>,

    /// Zero-based index of a combined "lat,lon" column
    #[arg(long, default_value = "1")]
    coordinates_column: usize,

    /// Zero-based index of a latitude column (requires --lon-column)
    #[arg(long, requires = "lon_column")]
    lat_column: Option<usize>,

    /// Zero-based index of a longitude column (requires --lat-column)
    #[arg(long, requires = "lat_column")]
    lon_column: Option<usize>,

    /// Resolve rows on all cores instead of streaming them
    #[arg(long)]
    parallel: bool,
}

/// Where a row keeps its coordinates
#[derive(Debug, Clone, Copy)]
enum CoordinateColumns {
    Pair(usize),
    Split { lat: usize, lon: usize },
}

impl CoordinateColumns {
    fn from_args(args: &Args) -> Self {
        match (args.lat_column, args.lon_column) {
            (Some(lat), Some(lon)) => CoordinateColumns::Split { lat, lon },
            _ => CoordinateColumns::Pair(args.coordinates_column),
        }
    }

    fn latitude(self, record: &StringRecord) -> Result<f64, RowError> {
        match self {
            CoordinateColumns::Pair(col) => parse_coordinate_pair(record.get(col)).map(|(lat, _)| lat),
            CoordinateColumns::Split { lat, .. } => parse_coordinate("latitude", record.get(lat)),
        }
    }

    fn longitude(self, record: &StringRecord) -> Result<f64, RowError> {
        match self {
            CoordinateColumns::Pair(col) => parse_coordinate_pair(record.get(col)).map(|(_, lon)| lon),
            CoordinateColumns::Split { lon, .. } => parse_coordinate("longitude", record.get(lon)),
        }
    }
}

/// Pad the record to the header width and append the two label columns
fn augment_row(
    record: &StringRecord,
    width: usize,
    outcome: &Result<MatchResult, RowError>,
    region_suffix: &str,
) -> StringRecord {
    let mut row: StringRecord = record.iter().collect();
    for _ in record.len()..width {
        row.push_field("");
    }

    match outcome {
        Ok(result) => {
            row.push_field(&result.location_label());
            row.push_field(&result.zone_label(region_suffix));
        }
        Err(e) => {
            row.push_field(e.label());
            row.push_field(e.label());
        }
    }
    row
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(geometry) = &args.geometry {
        config.catalog.path = geometry.clone();
    }

    info!("Loading regions from {}", config.catalog.path.display());
    let resolver = config.build_resolver(Arc::new(TracingSink));
    if resolver.catalog().is_empty() {
        warn!("Region catalog is empty, only fallback boxes will match");
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let headers = reader.headers()?.clone();
    let width = headers.len();
    let records: Vec<StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .context("Failed to read input rows")?;
    info!("Read {} rows from {}", records.len(), args.input.display());

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = WriterBuilder::new().flexible(true).from_writer(sink);

    let mut header_row = headers.clone();
    header_row.push_field("Micromarket");
    header_row.push_field("Area");
    writer.write_record(&header_row)?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let columns = CoordinateColumns::from_args(&args);
    let runner = BatchRunner::new(&resolver);
    let suffix = resolver.region_suffix().to_string();
    let mut summary = BatchSummary::default();

    if args.parallel {
        let outputs = runner.run_parallel(
            records,
            move |r: &StringRecord| columns.latitude(r),
            move |r: &StringRecord| columns.longitude(r),
        );
        for output in &outputs {
            summary.record(&output.outcome);
            writer.write_record(&augment_row(&output.record, width, &output.outcome, &suffix))?;
            pb.inc(1);
        }
    } else {
        let outputs = runner.run(
            records,
            move |r: &StringRecord| columns.latitude(r),
            move |r: &StringRecord| columns.longitude(r),
        );
        for output in outputs {
            summary.record(&output.outcome);
            writer.write_record(&augment_row(&output.record, width, &output.outcome, &suffix))?;
            pb.inc(1);
        }
    }

    writer.flush()?;
    pb.finish_with_message("done");

    info!(
        "Processed {} rows: {} matched, {} fallback, {} unmatched, {} errors",
        summary.rows, summary.matched, summary.fallback, summary.unmatched, summary.errors
    );

    Ok(())
}
