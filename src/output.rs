// 📁 File I/O
// Reading the sales file, writing the enriched file and the text/JSON report.

use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::report::SalesReport;
use crate::transaction::{EnrichedTransaction, ENRICHMENT_FIELD_NAMES, FIELD_NAMES};

const RULE_WIDTH: usize = 50;
const DAILY_TREND_ROWS: usize = 10;
const LOW_PERFORMER_ROWS: usize = 10;
const UNENRICHED_ROWS: usize = 20;
const NAME_WIDTH: usize = 24;

// ============================================================================
// READING
// ============================================================================

/// Read every line of the sales file (header included).
///
/// Tries UTF-8 first and falls back to Latin-1, where each byte maps to
/// the char with the same code point, so decoding never fails.
pub fn read_sales_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), "file is not valid UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    Ok(content.lines().map(str::to_string).collect())
}

// ============================================================================
// ENRICHED FILE
// ============================================================================

/// Write the 12-column pipe-delimited file: the eight input columns plus
/// API_Category, API_Brand, API_Rating and API_Match.
pub fn write_enriched_data(path: &Path, transactions: &[EnrichedTransaction]) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(csv::QuoteStyle::Never)
        .from_path(path)?;

    let header: Vec<&str> = FIELD_NAMES.iter().chain(ENRICHMENT_FIELD_NAMES.iter()).copied().collect();
    writer.write_record(&header)?;

    for tx in transactions {
        writer.write_record(tx.to_fields())?;
    }

    writer.flush()?;
    tracing::info!(path = %path.display(), rows = transactions.len(), "wrote enriched data");
    Ok(())
}

// ============================================================================
// REPORT
// ============================================================================

pub fn write_report(path: &Path, report: &SalesReport) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, render_report(report))?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}

pub fn write_report_json(path: &Path, report: &SalesReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "wrote report json");
    Ok(())
}

/// "₹1,234,567.89"
pub fn format_currency(amount: Decimal) -> String {
    let rounded = format!("{:.2}", amount.round_dp(2).abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount.is_sign_negative() && !amount.round_dp(2).is_zero() { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, frac_part)
}

fn short_name(name: &str) -> String {
    name.chars().take(NAME_WIDTH).collect()
}

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Render the report as the plain-text layout written to sales_report.txt.
pub fn render_report(report: &SalesReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_sections(&mut out, report);
    out
}

fn write_sections(out: &mut String, report: &SalesReport) -> std::fmt::Result {
    let header = &report.header;
    let overall = &report.overall;

    writeln!(out, "{}", rule('='))?;
    writeln!(out, "{}SALES ANALYTICS REPORT", " ".repeat(15))?;
    writeln!(out, "{}Generated: {}", " ".repeat(10), header.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "{}Records Processed: {}", " ".repeat(10), header.records_processed)?;
    writeln!(out, "{}", rule('='))?;
    writeln!(out)?;

    writeln!(out, "{}", SalesReport::SECTIONS[0])?;
    writeln!(out, "{}", rule('-'))?;
    writeln!(out, "Total Revenue:        {}", format_currency(overall.total_revenue))?;
    writeln!(out, "Total Transactions:   {}", overall.total_transactions)?;
    writeln!(out, "Average Order Value:  {}", format_currency(overall.average_order_value))?;
    match &overall.date_range {
        Some(range) => writeln!(out, "Date Range:           {} to {}", range.start, range.end)?,
        None => writeln!(out, "Date Range:           N/A")?,
    }
    if overall.saturated {
        writeln!(out, "Warning:              totals exceeded the numeric limit and were capped")?;
    }
    writeln!(out, "Parse Errors:         {}", header.parse_errors)?;
    writeln!(out, "Invalid Records:      {}", header.invalid_records)?;
    writeln!(out, "Filtered Out:         {}", header.filtered_out)?;
    writeln!(out)?;

    writeln!(out, "{}", SalesReport::SECTIONS[1])?;
    writeln!(out, "{}", rule('-'))?;
    writeln!(out, "{:<12} {:<15} {:<12} {:<12}", "Region", "Sales", "% of Total", "Transactions")?;
    writeln!(out, "{}", rule('-'))?;
    for region in &report.regions {
        writeln!(
            out,
            "{:<12} {:<15} {:>6.2}%      {:<12}",
            region.region,
            format_currency(region.revenue),
            region.share * 100.0,
            region.transaction_count
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", SalesReport::SECTIONS[2])?;
    writeln!(out, "{}", rule('-'))?;
    writeln!(out, "{:<6} {:<25} {:<15} {:<15}", "Rank", "Product Name", "Quantity Sold", "Revenue")?;
    writeln!(out, "{}", rule('-'))?;
    for (rank, product) in report.top_products.iter().enumerate() {
        writeln!(
            out,
            "{:<6} {:<25} {:<15} {}",
            rank + 1,
            short_name(&product.product_name),
            product.units_sold,
            format_currency(product.revenue)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", SalesReport::SECTIONS[3])?;
    writeln!(out, "{}", rule('-'))?;
    writeln!(out, "{:<6} {:<15} {:<15} {:<12}", "Rank", "Customer ID", "Total Spent", "Order Count")?;
    writeln!(out, "{}", rule('-'))?;
    for (rank, customer) in report.top_customers.iter().enumerate() {
        writeln!(
            out,
            "{:<6} {:<15} {:<15} {:<12}",
            rank + 1,
            customer.customer_id,
            format_currency(customer.total_spent),
            customer.order_count
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", SalesReport::SECTIONS[4])?;
    writeln!(out, "{}", rule('-'))?;
    writeln!(out, "{:<12} {:<15} {:<12} {:<15}", "Date", "Revenue", "Transactions", "Unique Customers")?;
    writeln!(out, "{}", rule('-'))?;
    for day in report.daily_trend.iter().take(DAILY_TREND_ROWS) {
        writeln!(
            out,
            "{:<12} {:<15} {:<12} {:<15}",
            day.date.to_string(),
            format_currency(day.revenue),
            day.transaction_count,
            day.unique_customers
        )?;
    }
    if report.daily_trend.len() > DAILY_TREND_ROWS {
        writeln!(out, "... and {} more days", report.daily_trend.len() - DAILY_TREND_ROWS)?;
    }
    writeln!(out)?;

    let performance = &report.product_performance;
    writeln!(out, "{}", SalesReport::SECTIONS[5])?;
    writeln!(out, "{}", rule('-'))?;
    match &performance.peak_day {
        Some(peak) => {
            writeln!(out, "Best Selling Day:     {}", peak.date)?;
            writeln!(out, "  Revenue:            {}", format_currency(peak.revenue))?;
            writeln!(out, "  Transactions:       {}", peak.transaction_count)?;
        }
        None => writeln!(out, "Best Selling Day:     N/A")?,
    }
    writeln!(out)?;

    if performance.low_performers.is_empty() {
        writeln!(out, "Low Performing Products: None")?;
    } else {
        writeln!(out, "Low Performing Products:")?;
        writeln!(out, "{:<25} {:<12} {:<15}", "Product Name", "Quantity", "Revenue")?;
        writeln!(out, "{}", rule('-'))?;
        for product in performance.low_performers.iter().take(LOW_PERFORMER_ROWS) {
            writeln!(
                out,
                "{:<25} {:<12} {}",
                short_name(&product.product_name),
                product.units_sold,
                format_currency(product.revenue)
            )?;
        }
        if performance.low_performers.len() > LOW_PERFORMER_ROWS {
            writeln!(out, "... and {} more products", performance.low_performers.len() - LOW_PERFORMER_ROWS)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Average Transaction Value per Region:")?;
    writeln!(out, "{:<12} {:<20}", "Region", "Avg Transaction Value")?;
    writeln!(out, "{}", rule('-'))?;
    for avg in &performance.region_averages {
        writeln!(out, "{:<12} {}", avg.region, format_currency(avg.average_order_value))?;
    }
    writeln!(out)?;

    let enrichment = &report.enrichment;
    writeln!(out, "{}", SalesReport::SECTIONS[6])?;
    writeln!(out, "{}", rule('-'))?;
    writeln!(out, "Total Products Processed:  {}", enrichment.total)?;
    writeln!(out, "Successfully Enriched:     {}", enrichment.enriched)?;
    writeln!(out, "Success Rate:              {:.2}%", enrichment.percentage)?;
    if !enrichment.catalog_available {
        writeln!(out, "Catalog:                   unavailable")?;
    }
    writeln!(out)?;

    let unenriched = &enrichment.unenriched_products;
    if unenriched.is_empty() {
        writeln!(out, "All products successfully enriched!")?;
    } else {
        writeln!(out, "Products That Couldn't Be Enriched ({} unique):", unenriched.len())?;
        for name in unenriched.iter().take(UNENRICHED_ROWS) {
            writeln!(out, "  - {}", name)?;
        }
        if unenriched.len() > UNENRICHED_ROWS {
            writeln!(out, "  ... and {} more products", unenriched.len() - UNENRICHED_ROWS)?;
        }
    }

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
