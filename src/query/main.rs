//! Query server for point lookups.
//!
//! Provides an HTTP API resolving latitude/longitude pairs to catalog
//! regions, with a reload endpoint for swapping in fresh geometry.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use micromarket::catalog::{CatalogStats, RegionCatalog};
use micromarket::config::Config;
use micromarket::diagnostics::{DiagnosticSink, TracingSink};
use micromarket::{MatchResult, RegionResolver};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Micromarket lookup server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region geometry file, overrides the configured catalog path
    #[arg(short, long)]
    geometry: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    resolver: RegionResolver,
    config: Config,
    sink: Arc<dyn DiagnosticSink>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Micromarket Query Server");

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(geometry) = args.geometry {
        config.catalog.path = geometry;
    }

    info!("Loading regions from {}", config.catalog.path.display());
    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let resolver = config.build_resolver(Arc::clone(&sink));
    info!(
        "Catalog ready with {} regions ({} fallback boxes)",
        resolver.catalog().len(),
        resolver.fallback().len()
    );

    let state = Arc::new(AppState {
        resolver,
        config,
        sink,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/lookup", get(lookup_handler))
        .route("/v1/reload", post(reload_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let catalog = state.resolver.catalog();

    Json(HealthResponse {
        status: if catalog.is_empty() { "degraded" } else { "ok" },
        catalog: catalog.stats(),
        fallback_boxes: state.resolver.fallback().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    catalog: CatalogStats,
    fallback_boxes: usize,
}

/// Resolve a single point
async fn lookup_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupQueryParams>,
) -> Result<Json<LookupResponse>, (StatusCode, String)> {
    let result = state
        .resolver
        .resolve(params.lat, params.lon)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(LookupResponse {
        latitude: params.lat,
        longitude: params.lon,
        result,
    }))
}

/// Rebuild the catalog from the configured source and swap it in
async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogStats>, (StatusCode, String)> {
    let path = state.config.catalog.path.clone();
    let sink = Arc::clone(&state.sink);

    let catalog =
        tokio::task::spawn_blocking(move || RegionCatalog::from_path(&path, sink.as_ref()))
            .await
            .map_err(|e| {
                tracing::error!("Catalog reload failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;

    let stats = catalog.stats();
    state.resolver.replace_catalog(catalog);

    Ok(Json(stats))
}

#[derive(Deserialize)]
struct LookupQueryParams {
    /// Latitude in degrees
    lat: f64,
    /// Longitude in degrees
    lon: f64,
}

#[derive(Serialize)]
struct LookupResponse {
    latitude: f64,
    longitude: f64,
    result: MatchResult,
}
