// 🔎 Filter Engine
// Region and amount-range narrowing of the valid set

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::transaction::TransactionRecord;

// ============================================================================
// FILTER CRITERIA
// ============================================================================

/// Both dimensions are optional; a missing one lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Allowed regions (exact match after trimming)
    pub regions: Option<BTreeSet<String>>,

    /// Inclusive lower bound on total_amount
    pub min_amount: Option<Decimal>,

    /// Inclusive upper bound on total_amount
    pub max_amount: Option<Decimal>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = regions
            .into_iter()
            .map(|r| Into::<String>::into(r).trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self.regions = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn with_amount_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_none() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    pub fn matches_region(&self, tx: &TransactionRecord) -> bool {
        match &self.regions {
            Some(allowed) => allowed.contains(tx.region.trim()),
            None => true,
        }
    }

    pub fn matches_amount(&self, tx: &TransactionRecord) -> bool {
        let amount = tx.total_amount();

        if let Some(min) = self.min_amount {
            if amount < min {
                return false;
            }
        }

        if let Some(max) = self.max_amount {
            if amount > max {
                return false;
            }
        }

        true
    }
}

// ============================================================================
// FILTER OUTCOME
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub input: usize,
    pub removed_by_region: usize,
    pub removed_by_amount: usize,
    pub output: usize,
}

impl FilterSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} → {} transactions ({} removed by region, {} by amount)",
            self.input, self.output, self.removed_by_region, self.removed_by_amount
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub records: Vec<TransactionRecord>,
    pub summary: FilterSummary,
}

/// Apply criteria: region first, then amount. Input order is kept and an
/// empty result is a normal outcome.
pub fn apply_filter(records: &[TransactionRecord], criteria: &FilterCriteria) -> FilterOutcome {
    let by_region: Vec<&TransactionRecord> = records
        .iter()
        .filter(|tx| criteria.matches_region(tx))
        .collect();

    let filtered: Vec<TransactionRecord> = by_region
        .iter()
        .filter(|tx| criteria.matches_amount(tx))
        .map(|tx| (*tx).clone())
        .collect();

    let summary = FilterSummary {
        input: records.len(),
        removed_by_region: records.len() - by_region.len(),
        removed_by_amount: by_region.len() - filtered.len(),
        output: filtered.len(),
    };

    if !criteria.is_empty() {
        tracing::info!("filter applied: {}", summary.summary());
    }

    FilterOutcome {
        records: filtered,
        summary,
    }
}

// ============================================================================
// FILTER OPTIONS (what the orchestrator offers the user)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct regions, sorted
    pub regions: Vec<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl FilterOptions {
    pub fn discover(records: &[TransactionRecord]) -> Self {
        let regions: BTreeSet<String> = records
            .iter()
            .map(|tx| tx.region.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let amounts = records.iter().map(|tx| tx.total_amount());

        FilterOptions {
            regions: regions.into_iter().collect(),
            min_amount: amounts.clone().min(),
            max_amount: amounts.max(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
