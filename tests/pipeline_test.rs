// End-to-end runs: file on disk → pipeline → enriched file + report

use rust_decimal_macros::dec;
use std::fs;

use sales_analytics::{
    load_catalog_file, read_sales_lines, render_report, run_pipeline, write_enriched_data,
    Catalog, CatalogProduct, FilterCriteria, PipelineSettings, ReasonCode, SalesError,
};

const SALES_DATA: &str = "\
TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region
T001|2024-12-01|P101|Laptop|2|45000|C001|North
T002|2024-12-01|P102|Mouse|5|500|C002|South
T003|2024-12-02|P103|Keyboard|-1|1500|C003|East

T004|2024-12-02|P104|USB Cable|3|1,200|C001|North
T005|2024-12-03|P105|Webcam|2
T001|2024-12-03|P101|Laptop|1|45000|C004|West
";

const CATALOG_JSON: &str = r#"{
    "products": [
        {"id": 101, "title": "Laptop", "category": "laptops", "brand": "Apple", "rating": 4.7},
        {"id": 104, "title": "USB Cable", "category": "accessories", "rating": 3.9}
    ],
    "total": 2
}"#;

fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_end_to_end_with_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(&dir, "sales_data.txt", SALES_DATA);
    let catalog_path = write_fixture(&dir, "catalog.json", CATALOG_JSON);

    let lines = read_sales_lines(&input).unwrap();
    let catalog = load_catalog_file(&catalog_path).unwrap();
    let run = run_pipeline(&lines, &FilterCriteria::new(), Some(&catalog), &PipelineSettings::default()).unwrap();

    // T005 has too few fields
    assert_eq!(run.parse.errors.len(), 1);
    assert_eq!(run.parse.records.len(), 5);

    // T003 negative quantity, second T001 duplicate
    assert_eq!(run.validation.summary.valid, 3);
    assert_eq!(run.validation.summary.invalid, 2);
    assert_eq!(run.validation.invalid[0].reasons, vec![ReasonCode::InvalidQuantity]);
    assert_eq!(run.validation.invalid[1].reasons, vec![ReasonCode::DuplicateId]);

    // 90000 + 2500 + 3600
    assert_eq!(run.analytics.total_revenue, dec!(96100));
    assert_eq!(run.analytics.transaction_count, 3);

    let enrichment = &run.enrichment.summary;
    assert_eq!(enrichment.enriched, 2);
    assert_eq!(enrichment.total, 3);
    assert_eq!(enrichment.unenriched_products, vec!["Mouse".to_string()]);

    let out = dir.path().join("data").join("enriched_sales_data.txt");
    write_enriched_data(&out, &run.enrichment.transactions).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    let rows: Vec<&str> = written.lines().collect();

    assert_eq!(rows.len(), 4);
    assert!(rows[1].ends_with("|laptops|Apple|4.7|True"));
    assert!(rows[2].ends_with("|||False"));
    assert!(rows[3].ends_with("|accessories||3.9|True"));
}

#[test]
fn test_region_and_amount_filter() {
    let lines: Vec<&str> = SALES_DATA.lines().collect();
    let criteria = FilterCriteria::new()
        .with_regions(["North"])
        .with_amount_range(Some(dec!(5000)), None);

    let run = run_pipeline(lines, &criteria, None, &PipelineSettings::default()).unwrap();

    assert_eq!(run.filter.summary.input, 3);
    assert_eq!(run.filter.summary.removed_by_region, 1);
    assert_eq!(run.filter.summary.removed_by_amount, 1);
    assert_eq!(run.analytics.transaction_count, 1);
    assert_eq!(run.analytics.regions[0].region, "North");
    assert_eq!(run.analytics.total_revenue, dec!(90000));
}

#[test]
fn test_all_invalid_input() {
    let lines = vec![
        "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region",
        "T001|2024-12-01|P101|Laptop|0|45000|C001|North",
        "T002|not-a-date|P102|Mouse|5|-1|C002|",
    ];

    let run = run_pipeline(lines, &FilterCriteria::new(), None, &PipelineSettings::default()).unwrap();

    assert_eq!(run.validation.summary.valid, 0);
    assert_eq!(run.validation.summary.invalid, 2);
    assert!(run.analytics.is_empty());
    assert!(run.report.overall.date_range.is_none());
    assert_eq!(run.enrichment.summary.percentage, 0.0);

    let text = render_report(&run.report);
    assert!(text.contains("Best Selling Day:     N/A"));
}

#[test]
fn test_empty_catalog_enriches_nothing() {
    let lines: Vec<&str> = SALES_DATA.lines().collect();
    let empty = Catalog::new(Vec::<CatalogProduct>::new());

    let run = run_pipeline(lines, &FilterCriteria::new(), Some(&empty), &PipelineSettings::default()).unwrap();

    assert_eq!(run.enrichment.summary.enriched, 0);
    assert_eq!(run.enrichment.summary.percentage, 0.0);
    assert!(!run.enrichment.summary.catalog_available);
    assert!(run.enrichment.transactions.iter().all(|tx| !tx.api_match()));
}

#[test]
fn test_overflowing_amount_is_invalid_record() {
    let lines = vec![
        "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region",
        "T001|2024-12-01|P101|Laptop|2|79228162514264337593543950335|C001|North",
        "T002|2024-12-01|P102|Mouse|5|500|C002|South",
    ];

    let run = run_pipeline(lines, &FilterCriteria::new(), None, &PipelineSettings::default()).unwrap();

    assert_eq!(run.validation.summary.valid, 1);
    assert_eq!(run.validation.invalid[0].record.transaction_id, "T001");
    assert_eq!(run.validation.invalid[0].reasons, vec![ReasonCode::InvalidAmount]);
    assert_eq!(run.analytics.total_revenue, dec!(2500));
    assert!(!run.analytics.saturated);
}

#[test]
fn test_overflowing_totals_do_not_abort_the_run() {
    let lines = vec![
        "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region",
        "T001|2024-12-01|P101|Laptop|1000000000000000000|50000000000|C001|North",
        "T002|2024-12-01|P101|Laptop|1000000000000000000|50000000000|C002|North",
    ];

    let run = run_pipeline(lines, &FilterCriteria::new(), None, &PipelineSettings::default()).unwrap();

    assert_eq!(run.validation.summary.valid, 2);
    assert!(run.analytics.saturated);
    assert!(run.report.overall.saturated);
    assert!(render_report(&run.report).contains("were capped"));
}

#[test]
fn test_wrong_header_is_rejected() {
    let lines = vec!["id,date,amount", "1,2024-12-01,10"];
    let result = run_pipeline(lines, &FilterCriteria::new(), None, &PipelineSettings::default());

    assert!(matches!(result, Err(SalesError::HeaderMismatch { .. })));
}

#[test]
fn test_empty_input_is_missing_header() {
    let result = run_pipeline(Vec::<String>::new(), &FilterCriteria::new(), None, &PipelineSettings::default());
    assert!(matches!(result, Err(SalesError::MissingHeader)));
}
