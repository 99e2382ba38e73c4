// 🔗 Enrichment Matcher - join transactions to catalog products
//
// Primary signal: product name vs catalog title similarity.
// Secondary signal: digits of ProductID ("P101" → 101) equal to catalog id.
//
// A missing or empty catalog is a normal input: every record comes out
// unenriched and the run continues.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::catalog::{Catalog, CatalogProduct};
use crate::transaction::{EnrichedTransaction, TransactionRecord};

/// Minimum name similarity for a catalog product to count as a match
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

/// Score floor for "one name contains the other"
const CONTAINMENT_BASE: f64 = 0.8;

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub transaction_id: String,
    pub matched_product: Option<CatalogProduct>,
    /// Name similarity of the chosen product (0.0 when unmatched)
    pub confidence: f64,
    /// True when the ProductID digits equal the matched catalog id
    pub id_match: bool,

    pub api_category: Option<String>,
    pub api_brand: Option<String>,
    pub api_rating: Option<f64>,
    pub api_match: bool,
}

impl EnrichmentResult {
    pub fn unmatched(transaction_id: &str) -> Self {
        EnrichmentResult {
            transaction_id: transaction_id.to_string(),
            matched_product: None,
            confidence: 0.0,
            id_match: false,
            api_category: None,
            api_brand: None,
            api_rating: None,
            api_match: false,
        }
    }

    pub fn matched(transaction_id: &str, candidate: &MatchCandidate) -> Self {
        let product = candidate.product.clone();
        EnrichmentResult {
            transaction_id: transaction_id.to_string(),
            api_category: Some(product.category.clone()),
            api_brand: product.brand.clone(),
            api_rating: product.rating,
            api_match: true,
            confidence: candidate.score,
            id_match: candidate.id_match,
            matched_product: Some(product),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    pub enriched: usize,
    pub total: usize,
    /// enriched / total × 100, 0 when total is 0
    pub percentage: f64,
    /// False when no catalog (or an empty one) was supplied
    pub catalog_available: bool,
    /// Distinct product names that found no match, sorted
    pub unenriched_products: Vec<String>,
}

impl EnrichmentSummary {
    pub fn summary(&self) -> String {
        format!(
            "Enriched {}/{} transactions ({:.1}%)",
            self.enriched, self.total, self.percentage
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentOutcome {
    pub transactions: Vec<EnrichedTransaction>,
    pub summary: EnrichmentSummary,
}

/// A catalog product that cleared the threshold for one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub product: CatalogProduct,
    pub score: f64,
    pub id_match: bool,
}

// ============================================================================
// ENRICHMENT MATCHER
// ============================================================================

pub struct EnrichmentMatcher {
    pub match_threshold: f64,
}

impl EnrichmentMatcher {
    pub fn new() -> Self {
        EnrichmentMatcher {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Best catalog product for one transaction, if any clears the threshold.
    ///
    /// Ranking: name score descending, then id signal, then lowest catalog id.
    pub fn best_match(&self, tx: &TransactionRecord, products: &[CatalogProduct]) -> Option<MatchCandidate> {
        let product_number = tx.product_number();

        products
            .iter()
            .filter_map(|product| {
                let score = score_name(&tx.product_name, &product.title);
                if score < self.match_threshold {
                    return None;
                }
                Some(MatchCandidate {
                    product: product.clone(),
                    score,
                    id_match: product_number == Some(product.id),
                })
            })
            .min_by(rank_candidates)
    }

    pub fn enrich_one(&self, tx: &TransactionRecord, catalog: Option<&Catalog>) -> EnrichmentResult {
        let products: &[CatalogProduct] = match catalog {
            Some(c) => c.products.as_slice(),
            None => &[],
        };

        match self.best_match(tx, products) {
            Some(candidate) => EnrichmentResult::matched(&tx.transaction_id, &candidate),
            None => EnrichmentResult::unmatched(&tx.transaction_id),
        }
    }

    pub fn enrich(&self, records: &[TransactionRecord], catalog: Option<&Catalog>) -> EnrichmentOutcome {
        let catalog_available = catalog.map(|c| !c.is_empty()).unwrap_or(false);
        if !catalog_available {
            tracing::warn!("no catalog data, all transactions left unenriched");
        }

        let transactions: Vec<EnrichedTransaction> = records
            .iter()
            .map(|tx| EnrichedTransaction {
                record: tx.clone(),
                enrichment: self.enrich_one(tx, catalog),
            })
            .collect();

        let enriched = transactions.iter().filter(|t| t.api_match()).count();
        let total = transactions.len();

        let unenriched_products: BTreeSet<String> = transactions
            .iter()
            .filter(|t| !t.api_match())
            .map(|t| t.record.product_name.clone())
            .collect();

        let summary = EnrichmentSummary {
            enriched,
            total,
            percentage: if total == 0 {
                0.0
            } else {
                enriched as f64 / total as f64 * 100.0
            },
            catalog_available,
            unenriched_products: unenriched_products.into_iter().collect(),
        };

        tracing::info!("{}", summary.summary());

        EnrichmentOutcome {
            transactions,
            summary,
        }
    }
}

impl Default for EnrichmentMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Enrich with the default threshold.
pub fn enrich(records: &[TransactionRecord], catalog: Option<&Catalog>) -> EnrichmentOutcome {
    EnrichmentMatcher::new().enrich(records, catalog)
}

fn rank_candidates(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.id_match.cmp(&a.id_match))
        .then_with(|| a.product.id.cmp(&b.product.id))
}

// ============================================================================
// SCORING
// ============================================================================

/// Lowercase, trim, collapse runs of whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity of a transaction's product name and a catalog title, 0.0 - 1.0.
///
/// - equal after normalization → 1.0
/// - one contains the other → 0.8 + 0.2 × shorter/longer
/// - otherwise → 1 − levenshtein / longer
pub fn score_name(product_name: &str, title: &str) -> f64 {
    let a = normalize_name(product_name);
    let b = normalize_name(title);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let longer = len_a.max(len_b) as f64;

    if a.contains(&b) || b.contains(&a) {
        let shorter = len_a.min(len_b) as f64;
        return CONTAINMENT_BASE + (1.0 - CONTAINMENT_BASE) * (shorter / longer);
    }

    1.0 - levenshtein_distance(&a, &b) as f64 / longer
}

/// Minimum number of single-character edits between two strings.
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Two rolling rows instead of the full matrix
    let mut previous: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut current = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[s2_chars.len()]
}

// ============================================================================
// TESTS
// ============================================================================
