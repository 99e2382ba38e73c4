// 📊 Analytics Engine
// Pure aggregation over the filtered valid set. Empty input is not an error.
//
// Grouping goes through BTreeMap and every sort has an explicit tie-break,
// so identical input always yields an identical summary.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::transaction::TransactionRecord;

/// Length of the top products / top customers lists
pub const TOP_N: usize = 5;

/// Products selling fewer units than this are "low performers"
pub const DEFAULT_LOW_PERFORMER_THRESHOLD: i64 = 10;

// ============================================================================
// SUMMARY TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub region: String,
    pub revenue: Decimal,
    pub transaction_count: usize,
    /// Fraction of total revenue (0.0 - 1.0)
    pub share: f64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStats {
    pub product_id: String,
    /// Name from the first transaction seen for this product
    pub product_name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub customer_id: String,
    pub total_spent: Decimal,
    pub order_count: usize,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_revenue: Decimal,
    pub transaction_count: usize,
    pub average_order_value: Decimal,
    /// None when there are no transactions
    pub date_range: Option<DateRange>,

    /// Revenue descending
    pub regions: Vec<RegionStats>,
    /// At most TOP_N, revenue descending, product id ascending on ties
    pub top_products: Vec<ProductStats>,
    /// At most TOP_N, revenue descending, customer id ascending on ties
    pub top_customers: Vec<CustomerStats>,
    /// Date ascending, only dates present in the data
    pub daily_trend: Vec<DailyStats>,
    /// Every product, same order as top_products
    pub products: Vec<ProductStats>,

    pub peak_day: Option<DailyStats>,
    /// Units ascending
    pub low_performers: Vec<ProductStats>,

    /// True when a revenue or unit total hit the numeric ceiling and was capped
    pub saturated: bool,
}

impl AnalyticsSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} transactions, revenue {}, AOV {}",
            self.transaction_count,
            self.total_revenue.round_dp(2),
            self.average_order_value.round_dp(2)
        )
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

// ============================================================================
// ANALYTICS ENGINE
// ============================================================================

pub struct AnalyticsEngine {
    pub low_performer_threshold: i64,
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        AnalyticsEngine {
            low_performer_threshold: DEFAULT_LOW_PERFORMER_THRESHOLD,
        }
    }

    pub fn with_low_performer_threshold(mut self, threshold: i64) -> Self {
        self.low_performer_threshold = threshold;
        self
    }

    pub fn analyze(&self, records: &[TransactionRecord]) -> AnalyticsSummary {
        // Amounts and quantities are non-negative, so if the grand totals fit
        // every per-group total fits too.
        let checked_revenue = records
            .iter()
            .try_fold(Decimal::ZERO, |acc, tx| acc.checked_add(tx.checked_total_amount()?));
        let units_fit = records
            .iter()
            .try_fold(0i64, |acc, tx| acc.checked_add(tx.quantity))
            .is_some();

        let saturated = checked_revenue.is_none() || !units_fit;
        if saturated {
            tracing::warn!("revenue or unit totals overflowed and were capped");
        }

        let total_revenue = checked_revenue.unwrap_or(Decimal::MAX);
        let transaction_count = records.len();

        let date_range = match (
            records.iter().map(|tx| tx.date).min(),
            records.iter().map(|tx| tx.date).max(),
        ) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        };

        let regions = self.region_breakdown(records, total_revenue);
        let products = self.product_breakdown(records);
        let customers = self.customer_breakdown(records);
        let daily_trend = self.daily_trend(records);
        let peak_day = peak_day(&daily_trend);

        let mut low_performers: Vec<ProductStats> = products
            .iter()
            .filter(|p| p.units_sold < self.low_performer_threshold)
            .cloned()
            .collect();
        low_performers.sort_by(|a, b| {
            a.units_sold
                .cmp(&b.units_sold)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        AnalyticsSummary {
            total_revenue,
            transaction_count,
            average_order_value: average(total_revenue, transaction_count),
            date_range,
            regions,
            top_products: products.iter().take(TOP_N).cloned().collect(),
            top_customers: customers.into_iter().take(TOP_N).collect(),
            daily_trend,
            products,
            peak_day,
            low_performers,
            saturated,
        }
    }

    fn region_breakdown(&self, records: &[TransactionRecord], total_revenue: Decimal) -> Vec<RegionStats> {
        let mut groups: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();

        for tx in records {
            let entry = groups.entry(tx.region.as_str()).or_insert((Decimal::ZERO, 0));
            entry.0 = entry.0.saturating_add(tx.total_amount());
            entry.1 += 1;
        }

        let mut regions: Vec<RegionStats> = groups
            .into_iter()
            .map(|(region, (revenue, count))| RegionStats {
                region: region.to_string(),
                revenue,
                transaction_count: count,
                share: ratio(revenue, total_revenue),
                average_order_value: average(revenue, count),
            })
            .collect();

        regions.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.region.cmp(&b.region))
        });

        regions
    }

    fn product_breakdown(&self, records: &[TransactionRecord]) -> Vec<ProductStats> {
        let mut groups: BTreeMap<&str, ProductStats> = BTreeMap::new();

        for tx in records {
            let entry = groups
                .entry(tx.product_id.as_str())
                .or_insert_with(|| ProductStats {
                    product_id: tx.product_id.clone(),
                    product_name: tx.product_name.clone(),
                    units_sold: 0,
                    revenue: Decimal::ZERO,
                    transaction_count: 0,
                });
            entry.units_sold = entry.units_sold.saturating_add(tx.quantity);
            entry.revenue = entry.revenue.saturating_add(tx.total_amount());
            entry.transaction_count += 1;
        }

        let mut products: Vec<ProductStats> = groups.into_values().collect();
        products.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        products
    }

    fn customer_breakdown(&self, records: &[TransactionRecord]) -> Vec<CustomerStats> {
        let mut groups: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();

        for tx in records {
            let entry = groups
                .entry(tx.customer_id.as_str())
                .or_insert((Decimal::ZERO, 0));
            entry.0 = entry.0.saturating_add(tx.total_amount());
            entry.1 += 1;
        }

        let mut customers: Vec<CustomerStats> = groups
            .into_iter()
            .map(|(customer_id, (total_spent, order_count))| CustomerStats {
                customer_id: customer_id.to_string(),
                total_spent,
                order_count,
                average_order_value: average(total_spent, order_count),
            })
            .collect();

        customers.sort_by(|a, b| {
            b.total_spent
                .cmp(&a.total_spent)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        customers
    }

    fn daily_trend(&self, records: &[TransactionRecord]) -> Vec<DailyStats> {
        let mut groups: BTreeMap<NaiveDate, (Decimal, usize, BTreeSet<&str>)> = BTreeMap::new();

        for tx in records {
            let entry = groups
                .entry(tx.date)
                .or_insert_with(|| (Decimal::ZERO, 0, BTreeSet::new()));
            entry.0 = entry.0.saturating_add(tx.total_amount());
            entry.1 += 1;
            entry.2.insert(tx.customer_id.as_str());
        }

        // BTreeMap iteration is already date ascending
        groups
            .into_iter()
            .map(|(date, (revenue, count, customers))| DailyStats {
                date,
                revenue,
                transaction_count: count,
                unique_customers: customers.len(),
            })
            .collect()
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze with default settings.
pub fn analyze(records: &[TransactionRecord]) -> AnalyticsSummary {
    AnalyticsEngine::new().analyze(records)
}

/// Highest-revenue day; the earliest one wins a tie.
fn peak_day(daily_trend: &[DailyStats]) -> Option<DailyStats> {
    let mut best: Option<&DailyStats> = None;

    for day in daily_trend {
        match best {
            Some(current) if day.revenue <= current.revenue => {}
            _ => best = Some(day),
        }
    }

    best.cloned()
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }

    total
        .checked_div(Decimal::from(count))
        .unwrap_or(Decimal::ZERO)
}

fn ratio(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }

    match (part.to_f64(), whole.to_f64()) {
        (Some(p), Some(w)) if w != 0.0 => p / w,
        _ => 0.0,
    }
}

// ============================================================================
// TESTS
// ============================================================================
