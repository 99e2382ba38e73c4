// 🏗️ Record Parser
// Pipe-delimited sales lines → ParsedRecord, one line at a time

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SalesError};
use crate::transaction::{ParsedRecord, FIELD_NAMES};

pub const DELIMITER: char = '|';

// ============================================================================
// PARSE ERRORS (data, not Err)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorKind {
    /// Line did not split into exactly 8 fields
    FieldCount { expected: usize, found: usize },

    /// TransactionID column is blank
    EmptyTransactionId,
}

impl ParseErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::FieldCount { .. } => "field_count",
            ParseErrorKind::EmptyTransactionId => "empty_transaction_id",
        }
    }
}

/// A dropped line. The run continues; these are only counted and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub line_number: usize,
    pub kind: ParseErrorKind,
    pub raw_line: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::FieldCount { expected, found } => write!(
                f,
                "line {}: expected {} fields, found {}",
                self.line_number, expected, found
            ),
            ParseErrorKind::EmptyTransactionId => {
                write!(f, "line {}: empty TransactionID", self.line_number)
            }
        }
    }
}

// ============================================================================
// RECORD PARSER
// ============================================================================

/// Lazy parser over an input's lines.
///
/// `new` consumes the header and fails only if it is missing or wrong.
/// Iterating yields one item per non-blank data line: `Ok(ParsedRecord)` or
/// `Err(ParseError)` for a dropped line. The sequence cannot be restarted;
/// build a new parser over the same lines to derive it again.
pub struct RecordParser<I> {
    lines: I,
    line_number: usize,
}

impl<I, S> RecordParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new<T>(lines: T) -> Result<Self>
    where
        T: IntoIterator<IntoIter = I>,
    {
        let mut lines = lines.into_iter();
        let mut line_number = 0;

        // Leading blank lines are tolerated before the header
        let header = loop {
            match lines.next() {
                Some(line) => {
                    line_number += 1;
                    let trimmed = line.as_ref().trim().trim_start_matches('\u{feff}').to_string();
                    if !trimmed.is_empty() {
                        break trimmed;
                    }
                }
                None => return Err(SalesError::MissingHeader),
            }
        };

        check_header(&header)?;

        Ok(RecordParser { lines, line_number })
    }

    fn parse_line(&self, line: &str) -> std::result::Result<ParsedRecord, ParseError> {
        let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();

        if fields.len() != FIELD_NAMES.len() {
            return Err(ParseError {
                line_number: self.line_number,
                kind: ParseErrorKind::FieldCount {
                    expected: FIELD_NAMES.len(),
                    found: fields.len(),
                },
                raw_line: line.to_string(),
            });
        }

        if fields[0].is_empty() {
            return Err(ParseError {
                line_number: self.line_number,
                kind: ParseErrorKind::EmptyTransactionId,
                raw_line: line.to_string(),
            });
        }

        Ok(ParsedRecord {
            transaction_id: fields[0].to_string(),
            date: fields[1].to_string(),
            product_id: fields[2].to_string(),
            // Commas inside product names are noise from upstream exports
            product_name: fields[3].replace(',', ""),
            quantity: parse_quantity(fields[4]),
            unit_price: parse_price(fields[5]),
            customer_id: fields[6].to_string(),
            region: fields[7].to_string(),
            line_number: self.line_number,
        })
    }
}

impl<I, S> Iterator for RecordParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = std::result::Result<ParsedRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_number += 1;

            let trimmed = line.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(self.parse_line(trimmed));
        }
    }
}

fn check_header(header: &str) -> Result<()> {
    let columns: Vec<&str> = header.split(DELIMITER).map(str::trim).collect();

    if columns != FIELD_NAMES {
        return Err(SalesError::HeaderMismatch {
            expected: FIELD_NAMES.join("|"),
            found: header.to_string(),
        });
    }

    Ok(())
}

/// "1,500" → 1500. Anything that is not an integer becomes None.
fn parse_quantity(raw: &str) -> Option<i64> {
    raw.replace(',', "").trim().parse::<i64>().ok()
}

/// "45,000.50" → 45000.50. Accepts plain and scientific notation.
fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .ok()
}

// ============================================================================
// EAGER HELPER
// ============================================================================

/// Everything the parser produced for one input, split by outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub records: Vec<ParsedRecord>,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Parsed {} records ({} lines dropped)",
            self.records.len(),
            self.errors.len()
        )
    }
}

/// Drain a `RecordParser` into records and dropped-line errors.
pub fn parse_all<T, S>(lines: T) -> Result<ParseOutcome>
where
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut outcome = ParseOutcome::default();

    for item in RecordParser::new(lines)? {
        match item {
            Ok(record) => outcome.records.push(record),
            Err(err) => {
                tracing::debug!("dropped {}", err);
                outcome.errors.push(err);
            }
        }
    }

    Ok(outcome)
}

// ============================================================================
// TESTS
// ============================================================================
