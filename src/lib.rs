// Sales Analytics - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod transaction;
pub mod parser;     // Pipe-delimited input → ParsedRecord
pub mod validator;  // Business rules, valid/invalid split
pub mod filter;     // Region + amount range
pub mod analytics;  // Revenue, regions, products, customers, days
pub mod catalog;    // Product catalog service client
pub mod enrichment; // Transaction ↔ catalog product matching
pub mod report;     // Report model
pub mod pipeline;   // All stages in order
pub mod output;     // File reading/writing, report text
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, SalesError};
pub use transaction::{EnrichedTransaction, ParsedRecord, TransactionRecord, FIELD_NAMES};
pub use parser::{parse_all, ParseError, ParseErrorKind, ParseOutcome, RecordParser};
pub use validator::{
    InvalidRecord, ReasonCode, ValidationOutcome, ValidationResult, ValidationSummary, Validator,
};
pub use filter::{apply_filter, FilterCriteria, FilterOptions, FilterOutcome, FilterSummary};
pub use analytics::{
    analyze, AnalyticsEngine, AnalyticsSummary, CustomerStats, DailyStats, DateRange,
    ProductStats, RegionStats,
};
pub use catalog::{
    fetch_or_degrade, load_catalog_file, load_configured_catalog, Catalog, CatalogClient,
    CatalogProduct,
};
pub use enrichment::{
    enrich, EnrichmentMatcher, EnrichmentOutcome, EnrichmentResult, EnrichmentSummary,
};
pub use report::{build_report, ReportContext, SalesReport};
pub use pipeline::{
    analyze_and_enrich, parse_and_validate, run_pipeline, PipelineRun, PipelineSettings,
    ValidatedInput,
};
pub use output::{read_sales_lines, render_report, write_enriched_data, write_report, write_report_json};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
