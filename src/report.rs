// 📋 Report Builder
// Shapes analytics + enrichment output into one report model.
// Numbers are copied from the AnalyticsSummary, never recomputed here.

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsSummary, CustomerStats, DailyStats, DateRange, ProductStats, RegionStats};
use crate::enrichment::EnrichmentSummary;
use crate::filter::FilterSummary;
use crate::validator::ValidationSummary;

// ============================================================================
// REPORT CONTEXT (run metadata supplied by the orchestrator)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    pub report_id: String,
    pub generated_at: NaiveDateTime,
    /// Lines dropped by the parser
    pub parse_errors: usize,
    pub validation: ValidationSummary,
    pub filter: FilterSummary,
}

impl ReportContext {
    /// Context stamped with a fresh id and the local time.
    pub fn now(parse_errors: usize, validation: ValidationSummary, filter: FilterSummary) -> Self {
        ReportContext {
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Local::now().naive_local(),
            parse_errors,
            validation,
            filter,
        }
    }
}

// ============================================================================
// REPORT SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub report_id: String,
    pub generated_at: NaiveDateTime,
    /// Transactions that reached analytics (after validation and filtering)
    pub records_processed: usize,
    pub parse_errors: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub filtered_out: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_revenue: Decimal,
    pub total_transactions: usize,
    pub average_order_value: Decimal,
    pub date_range: Option<DateRange>,
    /// Totals were capped at the numeric limit
    pub saturated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAverage {
    pub region: String,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub peak_day: Option<DailyStats>,
    pub low_performers: Vec<ProductStats>,
    /// Average order value descending
    pub region_averages: Vec<RegionAverage>,
    pub products: Vec<ProductStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub header: ReportHeader,
    pub overall: OverallSummary,
    pub regions: Vec<RegionStats>,
    pub top_products: Vec<ProductStats>,
    pub top_customers: Vec<CustomerStats>,
    pub daily_trend: Vec<DailyStats>,
    pub product_performance: ProductPerformance,
    pub enrichment: EnrichmentSummary,
}

impl SalesReport {
    /// Section titles in presentation order
    pub const SECTIONS: [&'static str; 7] = [
        "OVERALL SUMMARY",
        "REGION-WISE PERFORMANCE",
        "TOP 5 PRODUCTS",
        "TOP 5 CUSTOMERS",
        "DAILY SALES TREND",
        "PRODUCT PERFORMANCE ANALYSIS",
        "API ENRICHMENT SUMMARY",
    ];

    pub fn summary(&self) -> String {
        format!(
            "Report {}: {} transactions, revenue {}, {:.1}% enriched",
            self.header.report_id,
            self.overall.total_transactions,
            self.overall.total_revenue.round_dp(2),
            self.enrichment.percentage
        )
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub fn build_report(
    analytics: &AnalyticsSummary,
    enrichment: &EnrichmentSummary,
    context: &ReportContext,
) -> SalesReport {
    let mut region_averages: Vec<RegionAverage> = analytics
        .regions
        .iter()
        .map(|r| RegionAverage {
            region: r.region.clone(),
            average_order_value: r.average_order_value,
        })
        .collect();
    region_averages.sort_by(|a, b| {
        b.average_order_value
            .cmp(&a.average_order_value)
            .then_with(|| a.region.cmp(&b.region))
    });

    SalesReport {
        header: ReportHeader {
            report_id: context.report_id.clone(),
            generated_at: context.generated_at,
            records_processed: analytics.transaction_count,
            parse_errors: context.parse_errors,
            valid_records: context.validation.valid,
            invalid_records: context.validation.invalid,
            filtered_out: context.filter.input.saturating_sub(context.filter.output),
        },
        overall: OverallSummary {
            total_revenue: analytics.total_revenue,
            total_transactions: analytics.transaction_count,
            average_order_value: analytics.average_order_value,
            date_range: analytics.date_range,
            saturated: analytics.saturated,
        },
        regions: analytics.regions.clone(),
        top_products: analytics.top_products.clone(),
        top_customers: analytics.top_customers.clone(),
        daily_trend: analytics.daily_trend.clone(),
        product_performance: ProductPerformance {
            peak_day: analytics.peak_day.clone(),
            low_performers: analytics.low_performers.clone(),
            region_averages,
            products: analytics.products.clone(),
        },
        enrichment: enrichment.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
