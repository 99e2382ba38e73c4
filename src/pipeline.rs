// 🔄 Pipeline
// parse → validate → filter → {analyze, enrich} → report, in memory.
// No file or network I/O here; the catalog is fetched by the caller.

use serde::Serialize;

use crate::analytics::{AnalyticsEngine, AnalyticsSummary, DEFAULT_LOW_PERFORMER_THRESHOLD};
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::enrichment::{EnrichmentMatcher, EnrichmentOutcome, DEFAULT_MATCH_THRESHOLD};
use crate::error::Result;
use crate::filter::{apply_filter, FilterCriteria, FilterOutcome};
use crate::parser::{parse_all, ParseOutcome};
use crate::report::{build_report, ReportContext, SalesReport};
use crate::validator::{ValidationOutcome, Validator};

/// Stage knobs, usually taken from `AppConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub require_id_prefixes: bool,
    pub match_threshold: f64,
    pub low_performer_threshold: i64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            require_id_prefixes: false,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            low_performer_threshold: DEFAULT_LOW_PERFORMER_THRESHOLD,
        }
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        PipelineSettings {
            require_id_prefixes: config.validation.require_id_prefixes,
            match_threshold: config.matching.match_threshold,
            low_performer_threshold: config.analytics.low_performer_threshold,
        }
    }
}

/// Everything one run produced, kept together so callers (CLI, server,
/// tests) can show any stage's output.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub parse: ParseOutcome,
    pub validation: ValidationOutcome,
    pub filter: FilterOutcome,
    pub analytics: AnalyticsSummary,
    pub enrichment: EnrichmentOutcome,
    pub report: SalesReport,
}

impl PipelineRun {
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.parse.summary(),
            self.validation.summary.summary(),
            self.analytics.summary(),
            self.enrichment.summary.summary()
        )
    }
}

/// Parse and validate output, before any filter is chosen.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedInput {
    pub parse: ParseOutcome,
    pub validation: ValidationOutcome,
}

/// Run every stage over `lines` (header included).
///
/// Fails only when the header is missing or wrong. Dropped lines, invalid
/// records and enrichment misses all end up in the returned run.
pub fn run_pipeline<T, S>(
    lines: T,
    criteria: &FilterCriteria,
    catalog: Option<&Catalog>,
    settings: &PipelineSettings,
) -> Result<PipelineRun>
where
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input = parse_and_validate(lines, settings)?;
    Ok(analyze_and_enrich(input, criteria, catalog, settings))
}

/// First half of a run: parse and validate. Callers that need the valid
/// set before picking a filter (the CLI prompt) stop here.
pub fn parse_and_validate<T, S>(lines: T, settings: &PipelineSettings) -> Result<ValidatedInput>
where
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parse = parse_all(lines)?;
    tracing::info!("{}", parse.summary());

    let validation = Validator::new()
        .with_id_prefixes(settings.require_id_prefixes)
        .validate_batch(&parse.records);

    Ok(ValidatedInput { parse, validation })
}

/// Second half of a run: filter, analyze, enrich and build the report.
pub fn analyze_and_enrich(
    input: ValidatedInput,
    criteria: &FilterCriteria,
    catalog: Option<&Catalog>,
    settings: &PipelineSettings,
) -> PipelineRun {
    let ValidatedInput { parse, validation } = input;

    let filter = apply_filter(&validation.valid, criteria);

    let analytics = AnalyticsEngine::new()
        .with_low_performer_threshold(settings.low_performer_threshold)
        .analyze(&filter.records);

    let enrichment = EnrichmentMatcher::new()
        .with_threshold(settings.match_threshold)
        .enrich(&filter.records, catalog);

    let context = ReportContext::now(
        parse.errors.len(),
        validation.summary.clone(),
        filter.summary.clone(),
    );
    let report = build_report(&analytics, &enrichment.summary, &context);

    tracing::info!("{}", report.summary());

    PipelineRun {
        parse,
        validation,
        filter,
        analytics,
        enrichment,
        report,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogProduct;
    use crate::error::SalesError;
    use crate::validator::ReasonCode;
    use rust_decimal_macros::dec;

    const HEADER: &str = "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region";

    fn create_test_lines(rows: &[&str]) -> Vec<String> {
        std::iter::once(HEADER)
            .chain(rows.iter().copied())
            .map(String::from)
            .collect()
    }

    fn create_test_catalog() -> Catalog {
        Catalog::new(vec![CatalogProduct {
            id: 101,
            title: "Laptop".to_string(),
            category: "laptops".to_string(),
            brand: Some("Apple".to_string()),
            rating: Some(4.7),
        }])
    }

    #[test]
    fn test_full_run() {
        let lines = create_test_lines(&[
            "T001|2024-12-01|P101|Laptop|2|45000|C001|North",
            "T002|2024-12-01|P102|Mouse|5|500|C002|South",
            "T003|2024-12-02|P103|Keyboard|-1|1500|C003|East",
            "garbage line",
        ]);
        let catalog = create_test_catalog();

        let run = run_pipeline(&lines, &FilterCriteria::new(), Some(&catalog), &PipelineSettings::default()).unwrap();

        assert_eq!(run.parse.records.len(), 3);
        assert_eq!(run.parse.errors.len(), 1);
        assert_eq!(run.validation.summary.valid, 2);
        assert_eq!(run.validation.invalid[0].reasons, vec![ReasonCode::InvalidQuantity]);
        assert_eq!(run.analytics.total_revenue, dec!(92500));
        assert_eq!(run.enrichment.summary.enriched, 1);
        assert_eq!(run.report.header.parse_errors, 1);
        assert_eq!(run.report.header.invalid_records, 1);
    }

    #[test]
    fn test_filter_feeds_analytics_and_enrichment() {
        let lines = create_test_lines(&[
            "T001|2024-12-01|P101|Laptop|2|45000|C001|North",
            "T002|2024-12-01|P102|Mouse|5|500|C002|South",
        ]);
        let criteria = FilterCriteria::new().with_regions(["South"]);

        let run = run_pipeline(&lines, &criteria, None, &PipelineSettings::default()).unwrap();

        assert_eq!(run.analytics.transaction_count, 1);
        assert_eq!(run.analytics.total_revenue, dec!(2500));
        assert_eq!(run.enrichment.transactions.len(), 1);
        assert!(!run.enrichment.summary.catalog_available);
        assert_eq!(run.report.header.filtered_out, 1);
    }

    #[test]
    fn test_two_step_run_matches_single_call() {
        let lines = create_test_lines(&[
            "T001|2024-12-01|P101|Laptop|2|45000|C001|North",
            "T002|2024-12-01|P102|Mouse|5|500|C002|South",
            "T003|2024-12-02|P101|Laptop|0|45000|C003|East",
        ]);
        let criteria = FilterCriteria::new().with_regions(["North"]);
        let settings = PipelineSettings::default();

        let input = parse_and_validate(&lines, &settings).unwrap();
        assert_eq!(input.validation.valid.len(), 2);
        assert_eq!(input.validation.invalid.len(), 1);

        let two_step = analyze_and_enrich(input, &criteria, None, &settings);
        let single = run_pipeline(&lines, &criteria, None, &settings).unwrap();

        assert_eq!(two_step.validation.summary, single.validation.summary);
        assert_eq!(two_step.filter.summary, single.filter.summary);
        assert_eq!(two_step.analytics, single.analytics);
    }

    #[test]
    fn test_missing_header_is_err() {
        let lines = vec!["T001|2024-12-01|P101|Laptop|2|45000|C001|North"];
        let result = run_pipeline(lines, &FilterCriteria::new(), None, &PipelineSettings::default());

        assert!(matches!(result, Err(SalesError::HeaderMismatch { .. })));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = AppConfig::default();
        config.validation.require_id_prefixes = true;
        config.matching.match_threshold = 0.9;

        let settings = PipelineSettings::from(&config);
        assert!(settings.require_id_prefixes);
        assert_eq!(settings.match_threshold, 0.9);
        assert_eq!(settings.low_performer_threshold, 10);
    }
}
