// Sales Analytics - Web Server
// Read-only REST API over one pipeline run, computed at startup

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use sales_analytics::config::DEFAULT_CONFIG_PATH;
use sales_analytics::logging::init_logging;
use sales_analytics::{
    load_configured_catalog, read_sales_lines, run_pipeline, AppConfig, DateRange,
    FilterCriteria, PipelineRun, PipelineSettings, RegionStats, TransactionRecord,
};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Shared application state
#[derive(Clone)]
struct AppState {
    run: Arc<PipelineRun>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Headline numbers of the run
#[derive(Serialize)]
struct SummaryResponse {
    report_id: String,
    generated_at: NaiveDateTime,
    total_revenue: Decimal,
    total_transactions: usize,
    average_order_value: Decimal,
    date_range: Option<DateRange>,
    parse_errors: usize,
    valid_records: usize,
    invalid_records: usize,
    enrichment_percentage: f64,
}

#[derive(Serialize)]
struct RegionDetailResponse {
    stats: RegionStats,
    transactions: Vec<TransactionRecord>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/report - Full report model
async fn get_report(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.run.report.clone()))
}

/// GET /api/summary - Headline numbers
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let report = &state.run.report;

    Json(ApiResponse::ok(SummaryResponse {
        report_id: report.header.report_id.clone(),
        generated_at: report.header.generated_at,
        total_revenue: report.overall.total_revenue,
        total_transactions: report.overall.total_transactions,
        average_order_value: report.overall.average_order_value,
        date_range: report.overall.date_range,
        parse_errors: report.header.parse_errors,
        valid_records: report.header.valid_records,
        invalid_records: report.header.invalid_records,
        enrichment_percentage: report.enrichment.percentage,
    }))
}

/// GET /api/regions - Per-region statistics
async fn get_regions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.run.analytics.regions.clone()))
}

/// GET /api/regions/:region - One region's statistics and transactions
async fn get_region(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> impl IntoResponse {
    // Decode URL-encoded region name
    let decoded_region = urlencoding::decode(&region)
        .unwrap_or_else(|_| region.clone().into())
        .into_owned();

    let stats = state
        .run
        .analytics
        .regions
        .iter()
        .find(|r| r.region == decoded_region)
        .cloned();

    match stats {
        Some(stats) => {
            let transactions: Vec<TransactionRecord> = state
                .run
                .filter
                .records
                .iter()
                .filter(|tx| tx.region.trim() == decoded_region)
                .cloned()
                .collect();

            (
                StatusCode::OK,
                Json(ApiResponse::ok(RegionDetailResponse { stats, transactions })),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<RegionDetailResponse>::err(format!(
                "Region '{}' not found",
                decoded_region
            ))),
        )
            .into_response(),
    }
}

/// GET /api/transactions - Enriched transactions
async fn get_transactions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.run.enrichment.transactions.clone()))
}

/// GET /api/invalid - Records that failed validation, with reasons
async fn get_invalid(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.run.validation.invalid.clone()))
}

// ============================================================================
// Startup
// ============================================================================

/// Read, fetch and run the pipeline. Blocking; called via spawn_blocking.
fn compute_run(config: &AppConfig) -> Result<PipelineRun> {
    let lines = read_sales_lines(&config.paths.input)
        .with_context(|| format!("Failed to read {}", config.paths.input.display()))?;

    let catalog = load_configured_catalog(&config.catalog);

    let run = run_pipeline(
        &lines,
        &FilterCriteria::new(),
        catalog.as_ref(),
        &PipelineSettings::from(config),
    )?;
    Ok(run)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    println!("🌐 Sales Analytics - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config_path = std::env::var("SALES_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let run = tokio::task::spawn_blocking(move || compute_run(&config))
        .await
        .context("Pipeline task panicked")??;
    println!("✓ {}", run.summary());

    // Create shared state
    let state = AppState { run: Arc::new(run) };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/report", get(get_report))
        .route("/summary", get(get_summary))
        .route("/regions", get(get_regions))
        .route("/regions/:region", get(get_region))
        .route("/transactions", get(get_transactions))
        .route("/invalid", get(get_invalid))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = std::env::var("SALES_SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/summary", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
