// ⚙️ Configuration
// config.toml is optional; every key has a default.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::DEFAULT_LOW_PERFORMER_THRESHOLD;
use crate::catalog::DEFAULT_CATALOG_URL;
use crate::enrichment::DEFAULT_MATCH_THRESHOLD;
use crate::error::{Result, SalesError};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub analytics: AnalyticsConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub enriched_output: PathBuf,
    pub report_output: PathBuf,
    /// Also write the report model as JSON when set
    pub report_json: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            input: PathBuf::from("data/sales_data.txt"),
            enriched_output: PathBuf::from("data/enriched_sales_data.txt"),
            report_output: PathBuf::from("output/sales_report.txt"),
            report_json: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Page size requested from the service (service default when unset)
    pub limit: Option<usize>,
    pub timeout_secs: u64,
    /// Read the catalog from this JSON file instead of the network
    pub offline_file: Option<PathBuf>,
    /// Skip enrichment entirely
    pub disabled: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            limit: None,
            timeout_secs: 10,
            offline_file: None,
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub match_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub low_performer_threshold: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            low_performer_threshold: DEFAULT_LOW_PERFORMER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub require_id_prefixes: bool,
}

impl AppConfig {
    /// Load from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SalesError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        let threshold = self.matching.match_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SalesError::Config(format!(
                "matching.match_threshold must be within 0.0-1.0, got {}",
                threshold
            )));
        }

        if self.catalog.timeout_secs == 0 {
            return Err(SalesError::Config(
                "catalog.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.paths.input, PathBuf::from("data/sales_data.txt"));
        assert_eq!(config.catalog.base_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.matching.match_threshold, 0.8);
        assert_eq!(config.analytics.low_performer_threshold, 10);
        assert!(!config.validation.require_id_prefixes);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [paths]
            input = "in.txt"

            [matching]
            match_threshold = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.input, PathBuf::from("in.txt"));
        assert_eq!(config.paths.report_output, PathBuf::from("output/sales_report.txt"));
        assert_eq!(config.matching.match_threshold, 0.9);
        assert_eq!(config.catalog.timeout_secs, 10);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let result = AppConfig::from_toml("[matching]\nmatch_threshold = 1.5\n");
        assert!(matches!(result, Err(SalesError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = AppConfig::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.catalog.limit, None);
    }
}
