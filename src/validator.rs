// ✅ Validator - business rules over parsed records
// Every record comes out tagged Valid or Invalid(reasons). Nothing is raised.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::transaction::{ParsedRecord, TransactionRecord, DATE_FORMAT};

// ============================================================================
// REASON CODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Quantity missing, unparseable, or ≤ 0
    InvalidQuantity,
    /// UnitPrice missing, unparseable, or < 0
    InvalidPrice,
    EmptyTransactionId,
    /// Same TransactionID seen earlier in the batch
    DuplicateId,
    /// Date is not YYYY-MM-DD
    InvalidDate,
    EmptyRegion,
    EmptyProductId,
    EmptyProductName,
    EmptyCustomerId,
    /// T/P/C prefix rule (only when enabled)
    InvalidIdPrefix,
    /// Quantity × UnitPrice does not fit in a Decimal
    InvalidAmount,
}

impl ReasonCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::InvalidQuantity => "invalid_quantity",
            ReasonCode::InvalidPrice => "invalid_price",
            ReasonCode::EmptyTransactionId => "empty_transaction_id",
            ReasonCode::DuplicateId => "duplicate_id",
            ReasonCode::InvalidDate => "invalid_date",
            ReasonCode::EmptyRegion => "empty_region",
            ReasonCode::EmptyProductId => "empty_product_id",
            ReasonCode::EmptyProductName => "empty_product_name",
            ReasonCode::EmptyCustomerId => "empty_customer_id",
            ReasonCode::InvalidIdPrefix => "invalid_id_prefix",
            ReasonCode::InvalidAmount => "invalid_amount",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationResult {
    Valid(TransactionRecord),
    Invalid {
        record: ParsedRecord,
        reasons: Vec<ReasonCode>,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn reasons(&self) -> &[ReasonCode] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid { reasons, .. } => reasons,
        }
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            ValidationResult::Valid(tx) => &tx.transaction_id,
            ValidationResult::Invalid { record, .. } => &record.transaction_id,
        }
    }
}

/// A record that failed one or more rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRecord {
    pub record: ParsedRecord,
    pub reasons: Vec<ReasonCode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// How many invalid records carry each reason
    pub reason_counts: BTreeMap<ReasonCode, usize>,
}

impl ValidationSummary {
    pub fn summary(&self) -> String {
        format!(
            "Valid: {} | Invalid: {} (of {})",
            self.valid, self.invalid, self.total
        )
    }
}

/// Disjoint, exhaustive split of one batch, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: Vec<TransactionRecord>,
    pub invalid: Vec<InvalidRecord>,
    pub summary: ValidationSummary,
}

// ============================================================================
// VALIDATOR
// ============================================================================

pub struct Validator {
    /// Require TransactionID/ProductID/CustomerID to start with T/P/C
    pub require_id_prefixes: bool,
}

impl Validator {
    pub fn new() -> Self {
        Validator {
            require_id_prefixes: false,
        }
    }

    pub fn with_id_prefixes(mut self, enabled: bool) -> Self {
        self.require_id_prefixes = enabled;
        self
    }

    /// Validate a single record in isolation (no duplicate check).
    pub fn validate(&self, record: &ParsedRecord) -> ValidationResult {
        self.validate_with_duplicate(record, false)
    }

    /// Validate a whole batch.
    ///
    /// Duplicate policy: the first record carrying an id claims it, whether
    /// or not that record is itself valid. Every later record with the same
    /// id gets `duplicate_id` on top of any other reasons.
    pub fn validate_batch(&self, records: &[ParsedRecord]) -> ValidationOutcome {
        let mut seen_ids: HashSet<&str> = HashSet::new();
        let mut outcome = ValidationOutcome::default();

        for record in records {
            let id = record.transaction_id.trim();
            let is_duplicate = !id.is_empty() && !seen_ids.insert(id);

            match self.validate_with_duplicate(record, is_duplicate) {
                ValidationResult::Valid(tx) => outcome.valid.push(tx),
                ValidationResult::Invalid { record, reasons } => {
                    for reason in &reasons {
                        *outcome.summary.reason_counts.entry(*reason).or_insert(0) += 1;
                    }
                    outcome.invalid.push(InvalidRecord { record, reasons });
                }
            }
        }

        outcome.summary.total = records.len();
        outcome.summary.valid = outcome.valid.len();
        outcome.summary.invalid = outcome.invalid.len();

        tracing::info!(
            total = outcome.summary.total,
            valid = outcome.summary.valid,
            invalid = outcome.summary.invalid,
            "validation complete"
        );

        outcome
    }

    fn validate_with_duplicate(&self, record: &ParsedRecord, is_duplicate: bool) -> ValidationResult {
        let mut reasons = Vec::new();

        if record.transaction_id.trim().is_empty() {
            reasons.push(ReasonCode::EmptyTransactionId);
        }

        if is_duplicate {
            reasons.push(ReasonCode::DuplicateId);
        }

        let date = self.validate_date(&record.date);
        if date.is_none() {
            reasons.push(ReasonCode::InvalidDate);
        }

        if record.product_id.trim().is_empty() {
            reasons.push(ReasonCode::EmptyProductId);
        }

        if record.product_name.trim().is_empty() {
            reasons.push(ReasonCode::EmptyProductName);
        }

        let quantity = record.quantity.filter(|q| *q > 0);
        if quantity.is_none() {
            reasons.push(ReasonCode::InvalidQuantity);
        }

        let unit_price = record.unit_price.filter(|p| *p >= Decimal::ZERO);
        if unit_price.is_none() {
            reasons.push(ReasonCode::InvalidPrice);
        }

        if let (Some(q), Some(p)) = (quantity, unit_price) {
            if Decimal::from(q).checked_mul(p).is_none() {
                reasons.push(ReasonCode::InvalidAmount);
            }
        }

        if record.customer_id.trim().is_empty() {
            reasons.push(ReasonCode::EmptyCustomerId);
        }

        if record.region.trim().is_empty() {
            reasons.push(ReasonCode::EmptyRegion);
        }

        if self.require_id_prefixes && !self.has_valid_prefixes(record) {
            reasons.push(ReasonCode::InvalidIdPrefix);
        }

        match (reasons.is_empty(), date, quantity, unit_price) {
            (true, Some(date), Some(quantity), Some(unit_price)) => {
                ValidationResult::Valid(TransactionRecord {
                    transaction_id: record.transaction_id.trim().to_string(),
                    date,
                    product_id: record.product_id.trim().to_string(),
                    product_name: record.product_name.trim().to_string(),
                    quantity,
                    unit_price,
                    customer_id: record.customer_id.trim().to_string(),
                    region: record.region.trim().to_string(),
                })
            }
            _ => ValidationResult::Invalid {
                record: record.clone(),
                reasons,
            },
        }
    }

    fn validate_date(&self, date: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
    }

    fn has_valid_prefixes(&self, record: &ParsedRecord) -> bool {
        record.transaction_id.trim().starts_with('T')
            && record.product_id.trim().starts_with('P')
            && record.customer_id.trim().starts_with('C')
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_record(id: &str, quantity: Option<i64>, unit_price: Option<Decimal>) -> ParsedRecord {
        ParsedRecord {
            transaction_id: id.to_string(),
            date: "2024-12-01".to_string(),
            product_id: "P101".to_string(),
            product_name: "Laptop".to_string(),
            quantity,
            unit_price,
            customer_id: "C001".to_string(),
            region: "North".to_string(),
            line_number: 2,
        }
    }

    #[test]
    fn test_valid_record() {
        let validator = Validator::new();
        let result = validator.validate(&create_test_record("T001", Some(2), Some(dec!(45000))));

        assert!(result.is_valid());
        match result {
            ValidationResult::Valid(tx) => {
                assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
                assert_eq!(tx.total_amount(), dec!(90000));
            }
            _ => panic!("expected valid"),
        }
    }

    #[test]
    fn test_negative_quantity_is_invalid_quantity() {
        let validator = Validator::new();
        let result = validator.validate(&create_test_record("T001", Some(-1), Some(dec!(500))));

        assert!(!result.is_valid());
        assert_eq!(result.reasons(), &[ReasonCode::InvalidQuantity]);
        assert_eq!(ReasonCode::InvalidQuantity.code(), "invalid_quantity");
    }

    #[test]
    fn test_zero_quantity_and_missing_quantity() {
        let validator = Validator::new();

        let zero = validator.validate(&create_test_record("T001", Some(0), Some(dec!(500))));
        assert_eq!(zero.reasons(), &[ReasonCode::InvalidQuantity]);

        let missing = validator.validate(&create_test_record("T001", None, Some(dec!(500))));
        assert_eq!(missing.reasons(), &[ReasonCode::InvalidQuantity]);
    }

    #[test]
    fn test_price_rules() {
        let validator = Validator::new();

        let negative = validator.validate(&create_test_record("T001", Some(1), Some(dec!(-0.01))));
        assert_eq!(negative.reasons(), &[ReasonCode::InvalidPrice]);

        let missing = validator.validate(&create_test_record("T001", Some(1), None));
        assert_eq!(missing.reasons(), &[ReasonCode::InvalidPrice]);

        // Free items are allowed
        let zero = validator.validate(&create_test_record("T001", Some(1), Some(dec!(0))));
        assert!(zero.is_valid());
    }

    #[test]
    fn test_amount_overflow_is_invalid_amount() {
        let validator = Validator::new();

        let huge = validator.validate(&create_test_record("T001", Some(2), Some(Decimal::MAX)));
        assert!(!huge.is_valid());
        assert_eq!(huge.reasons(), &[ReasonCode::InvalidAmount]);
        assert_eq!(ReasonCode::InvalidAmount.code(), "invalid_amount");

        // One unit at the largest price still fits
        let fits = validator.validate(&create_test_record("T002", Some(1), Some(Decimal::MAX)));
        assert!(fits.is_valid());
    }

    #[test]
    fn test_bad_date_and_empty_fields_collect_all_reasons() {
        let validator = Validator::new();
        let mut record = create_test_record("T001", Some(1), Some(dec!(10)));
        record.date = "2024-13-45".to_string();
        record.region = "  ".to_string();
        record.customer_id = String::new();

        let result = validator.validate(&record);

        assert_eq!(
            result.reasons(),
            &[ReasonCode::InvalidDate, ReasonCode::EmptyCustomerId, ReasonCode::EmptyRegion]
        );
    }

    #[test]
    fn test_duplicate_id_first_wins() {
        let validator = Validator::new();
        let records = vec![
            create_test_record("T001", Some(1), Some(dec!(10))),
            create_test_record("T002", Some(1), Some(dec!(10))),
            create_test_record("T001", Some(3), Some(dec!(20))),
            create_test_record("T001", Some(4), Some(dec!(30))),
        ];

        let outcome = validator.validate_batch(&records);

        assert_eq!(outcome.valid.len(), 2);
        assert_eq!(outcome.valid[0].transaction_id, "T001");
        assert_eq!(outcome.valid[0].quantity, 1);
        assert_eq!(outcome.invalid.len(), 2);
        for invalid in &outcome.invalid {
            assert_eq!(invalid.record.transaction_id, "T001");
            assert_eq!(invalid.reasons, vec![ReasonCode::DuplicateId]);
        }
        assert_eq!(outcome.summary.reason_counts[&ReasonCode::DuplicateId], 2);
    }

    #[test]
    fn test_duplicate_of_invalid_first_occurrence() {
        let validator = Validator::new();
        let records = vec![
            create_test_record("T001", Some(-1), Some(dec!(10))),
            create_test_record("T001", Some(1), Some(dec!(10))),
        ];

        let outcome = validator.validate_batch(&records);

        assert!(outcome.valid.is_empty());
        assert_eq!(outcome.invalid[0].reasons, vec![ReasonCode::InvalidQuantity]);
        assert_eq!(outcome.invalid[1].reasons, vec![ReasonCode::DuplicateId]);
    }

    #[test]
    fn test_partition_is_disjoint_and_exhaustive() {
        let validator = Validator::new();
        let records = vec![
            create_test_record("T001", Some(1), Some(dec!(10))),
            create_test_record("T002", Some(-1), Some(dec!(10))),
            create_test_record("T003", Some(2), None),
            create_test_record("T004", Some(2), Some(dec!(5))),
            create_test_record("T001", Some(2), Some(dec!(5))),
        ];

        let outcome = validator.validate_batch(&records);

        assert_eq!(outcome.valid.len() + outcome.invalid.len(), records.len());
        assert_eq!(outcome.summary.total, 5);
        assert_eq!(outcome.summary.valid, 2);
        assert_eq!(outcome.summary.invalid, 3);

        let valid_lines: HashSet<_> = outcome.valid.iter().map(|t| t.transaction_id.clone()).collect();
        assert!(valid_lines.contains("T001"));
        assert!(valid_lines.contains("T004"));
    }

    #[test]
    fn test_id_prefix_rule_is_opt_in() {
        let mut record = create_test_record("X001", Some(1), Some(dec!(10)));
        record.customer_id = "K9".to_string();

        assert!(Validator::new().validate(&record).is_valid());

        let strict = Validator::new().with_id_prefixes(true);
        assert_eq!(strict.validate(&record).reasons(), &[ReasonCode::InvalidIdPrefix]);
    }
}
