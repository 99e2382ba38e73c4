use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use sales_analytics::config::DEFAULT_CONFIG_PATH;
use sales_analytics::filter::FilterOptions;
use sales_analytics::logging::init_logging;
use sales_analytics::output::format_currency;
use sales_analytics::{
    analyze_and_enrich, load_configured_catalog, parse_and_validate, read_sales_lines,
    write_enriched_data, write_report, write_report_json, AppConfig, FilterCriteria,
    PipelineSettings,
};

#[derive(Parser)]
#[command(name = "sales-analytics")]
#[command(about = "Sales data analytics with product catalog enrichment")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when missing)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Sales data file
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long)]
    enriched_output: Option<PathBuf>,

    #[arg(long)]
    report_output: Option<PathBuf>,

    /// Also write the report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Keep only these regions (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    #[arg(long)]
    min_amount: Option<Decimal>,

    #[arg(long)]
    max_amount: Option<Decimal>,

    /// Ask for filters on stdin
    #[arg(long)]
    interactive: bool,

    /// Read the catalog from a JSON file instead of the network
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    #[arg(long)]
    catalog_limit: Option<usize>,

    /// Skip catalog enrichment
    #[arg(long)]
    no_enrich: bool,

    /// Enforce T/P/C prefixes on transaction, product and customer ids
    #[arg(long)]
    require_id_prefixes: bool,
}

impl Cli {
    /// CLI flags win over config file values.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(input) = &self.input {
            config.paths.input = input.clone();
        }
        if let Some(path) = &self.enriched_output {
            config.paths.enriched_output = path.clone();
        }
        if let Some(path) = &self.report_output {
            config.paths.report_output = path.clone();
        }
        if self.report_json.is_some() {
            config.paths.report_json = self.report_json.clone();
        }
        if self.catalog_file.is_some() {
            config.catalog.offline_file = self.catalog_file.clone();
        }
        if self.catalog_limit.is_some() {
            config.catalog.limit = self.catalog_limit;
        }
        if self.no_enrich {
            config.catalog.disabled = true;
        }
        if self.require_id_prefixes {
            config.validation.require_id_prefixes = true;
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    cli.apply_to(&mut config);

    println!("{}", "=".repeat(50));
    println!("{}SALES ANALYTICS SYSTEM", " ".repeat(15));
    println!("{}", "=".repeat(50));
    println!();

    // 1. Read
    println!("[1/10] Reading sales data...");
    let lines = read_sales_lines(&config.paths.input)
        .with_context(|| format!("Failed to read {}", config.paths.input.display()))?;
    println!("✓ Read {} lines from {}", lines.len(), config.paths.input.display());
    println!();

    // 2. Parse + validate
    println!("[2/10] Parsing and validating data...");
    let settings = PipelineSettings::from(&config);
    let input = parse_and_validate(&lines, &settings).context("Input file is not a sales data file")?;
    println!("✓ {}", input.parse.summary());
    println!("✓ {}", input.validation.summary.summary());
    println!();

    // 3. Filter options
    println!("[3/10] Filter Options Available:");
    let options = FilterOptions::discover(&input.validation.valid);
    print_filter_options(&options);

    let mut criteria = FilterCriteria::new()
        .with_regions(cli.regions.iter().cloned())
        .with_amount_range(cli.min_amount, cli.max_amount);
    if cli.interactive {
        criteria = prompt_filter(criteria)?;
    }
    println!();

    // 4. Catalog
    println!("[4/10] Fetching product data from API...");
    let catalog = load_configured_catalog(&config.catalog);
    match &catalog {
        Some(c) => println!("✓ Fetched {} products", c.len()),
        None => {
            println!("✗ Catalog unavailable");
            println!("  Continuing without API enrichment...");
        }
    }
    println!();

    // 5. Filter + analytics
    println!("[5/10] Filtering and analyzing...");
    let run = analyze_and_enrich(input, &criteria, catalog.as_ref(), &settings);
    if !criteria.is_empty() {
        println!("✓ Filter: {}", run.filter.summary.summary());
    }
    println!("✓ Analysis complete: {}", run.analytics.summary());
    println!();

    // 6. Enrichment
    println!("[6/10] Enriching sales data...");
    if run.enrichment.summary.catalog_available {
        println!("✓ {}", run.enrichment.summary.summary());
    } else {
        println!("⚠ Skipped (no API data available)");
    }
    println!();

    // 7. Enriched file
    println!("[7/10] Saving enriched data...");
    write_enriched_data(&config.paths.enriched_output, &run.enrichment.transactions)
        .with_context(|| format!("Failed to write {}", config.paths.enriched_output.display()))?;
    println!("✓ Saved to: {}", config.paths.enriched_output.display());
    println!();

    // 8. Report
    println!("[8/10] Generating report...");
    write_report(&config.paths.report_output, &run.report)
        .with_context(|| format!("Failed to write {}", config.paths.report_output.display()))?;
    println!("✓ Report saved to: {}", config.paths.report_output.display());
    println!();

    // 9. JSON report
    println!("[9/10] Exporting report JSON...");
    match &config.paths.report_json {
        Some(path) => {
            write_report_json(path, &run.report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Saved to: {}", path.display());
        }
        None => println!("⚠ Skipped (paths.report_json not set)"),
    }
    println!();

    // 10. Done
    println!("[10/10] Process Complete!");
    println!("{}", "=".repeat(50));
    println!();
    println!("Generated Files:");
    println!("  - {}", config.paths.enriched_output.display());
    println!("  - {}", config.paths.report_output.display());
    if let Some(path) = &config.paths.report_json {
        println!("  - {}", path.display());
    }

    Ok(())
}

fn print_filter_options(options: &FilterOptions) {
    if options.regions.is_empty() {
        println!("No valid transactions to filter");
        return;
    }

    println!("Regions: {}", options.regions.join(", "));
    if let (Some(min), Some(max)) = (options.min_amount, options.max_amount) {
        println!("Amount Range: {} - {}", format_currency(min), format_currency(max));
    }
}

/// Ask for region and amount bounds. Blank answers keep the current value;
/// unparseable amounts are skipped.
fn prompt_filter(mut criteria: FilterCriteria) -> Result<FilterCriteria> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let region = ask(&mut input, "Enter region to filter (or press Enter to skip): ")?;
    if !region.is_empty() {
        criteria = criteria.with_regions(region.split(',').map(str::trim).filter(|r| !r.is_empty()));
    }

    let min = ask(&mut input, "Enter minimum amount (or press Enter to skip): ")?;
    let max = ask(&mut input, "Enter maximum amount (or press Enter to skip): ")?;

    let min_amount = parse_amount(&min, "minimum").or(criteria.min_amount);
    let max_amount = parse_amount(&max, "maximum").or(criteria.max_amount);

    Ok(criteria.with_amount_range(min_amount, max_amount))
}

fn ask(input: &mut impl BufRead, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn parse_amount(raw: &str, label: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    match raw.replace(',', "").parse::<Decimal>() {
        Ok(amount) => Some(amount),
        Err(_) => {
            println!("Invalid {} amount, skipping...", label);
            None
        }
    }
}
