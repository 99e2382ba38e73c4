// 🧾 Transaction records
// ParsedRecord = what the parser saw, TransactionRecord = what survived validation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentResult;

/// Column names of the input file, in order.
pub const FIELD_NAMES: [&str; 8] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
];

/// Columns appended to the enriched output file.
pub const ENRICHMENT_FIELD_NAMES: [&str; 4] = ["API_Category", "API_Brand", "API_Rating", "API_Match"];

/// Expected date format for the Date column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// PARSED RECORD (parser output, not yet validated)
// ============================================================================

/// One data line split into fields.
///
/// Numeric fields that could not be parsed are `None`; the validator turns
/// that into a reason code instead of the parser aborting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub transaction_id: String,
    pub date: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
    pub customer_id: String,
    pub region: String,

    /// 1-based line number in the source (header is line 1)
    pub line_number: usize,
}

// ============================================================================
// TRANSACTION RECORD (validated)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub customer_id: String,
    pub region: String,
}

impl TransactionRecord {
    /// quantity × unit_price, recomputed on every call.
    ///
    /// The validator rejects records whose product does not fit in a
    /// `Decimal`, so for validated records this is exact.
    pub fn total_amount(&self) -> Decimal {
        self.checked_total_amount().unwrap_or(Decimal::MAX)
    }

    /// quantity × unit_price, or None when it overflows.
    pub fn checked_total_amount(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }

    /// Numeric part of the product id ("P101" → 101), used as a secondary
    /// signal when matching against catalog ids.
    pub fn product_number(&self) -> Option<u32> {
        let digits: String = self
            .product_id
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        if digits.is_empty() {
            return None;
        }

        digits.parse().ok()
    }

    /// The eight input columns, formatted for pipe-delimited output.
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.transaction_id.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.product_id.clone(),
            self.product_name.clone(),
            self.quantity.to_string(),
            self.unit_price.to_string(),
            self.customer_id.clone(),
            self.region.clone(),
        ]
    }
}

// ============================================================================
// ENRICHED TRANSACTION
// ============================================================================

/// A valid transaction plus the outcome of catalog matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedTransaction {
    pub record: TransactionRecord,
    pub enrichment: EnrichmentResult,
}

impl EnrichedTransaction {
    pub fn api_category(&self) -> Option<&str> {
        self.enrichment.api_category.as_deref()
    }

    pub fn api_brand(&self) -> Option<&str> {
        self.enrichment.api_brand.as_deref()
    }

    pub fn api_rating(&self) -> Option<f64> {
        self.enrichment.api_rating
    }

    pub fn api_match(&self) -> bool {
        self.enrichment.api_match
    }

    /// All twelve output columns. Missing annotations are written as empty
    /// strings and the match flag as True/False.
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = self.record.to_fields();
        fields.push(self.api_category().unwrap_or("").to_string());
        fields.push(self.api_brand().unwrap_or("").to_string());
        fields.push(
            self.api_rating()
                .map(|r| r.to_string())
                .unwrap_or_default(),
        );
        fields.push(if self.api_match() { "True" } else { "False" }.to_string());
        fields
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_record(product_id: &str, quantity: i64, unit_price: Decimal) -> TransactionRecord {
        TransactionRecord {
            transaction_id: "T001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            product_id: product_id.to_string(),
            product_name: "Laptop".to_string(),
            quantity,
            unit_price,
            customer_id: "C001".to_string(),
            region: "North".to_string(),
        }
    }

    #[test]
    fn test_total_amount_is_exact() {
        let tx = create_test_record("P101", 3, dec!(0.1));
        assert_eq!(tx.total_amount(), dec!(0.3));

        let tx = create_test_record("P101", 2, dec!(45000));
        assert_eq!(tx.total_amount(), dec!(90000));
    }

    #[test]
    fn test_product_number() {
        assert_eq!(create_test_record("P101", 1, dec!(1)).product_number(), Some(101));
        assert_eq!(create_test_record("p5", 1, dec!(1)).product_number(), Some(5));
        assert_eq!(create_test_record("LAPTOP", 1, dec!(1)).product_number(), None);
        assert_eq!(create_test_record("", 1, dec!(1)).product_number(), None);
    }

    #[test]
    fn test_to_fields_order() {
        let tx = create_test_record("P101", 2, dec!(45000));
        assert_eq!(
            tx.to_fields(),
            vec!["T001", "2024-12-01", "P101", "Laptop", "2", "45000", "C001", "North"]
        );
    }
}
