// ⚠️ Error types
// Only setup faults and collaborator failures are errors. Per-record problems
// (parse errors, validation failures, enrichment misses) are data, not Err.

#[derive(Debug, thiserror::Error)]
pub enum SalesError {
    #[error("input is empty: expected a header line")]
    MissingHeader,

    #[error("unexpected header: expected \"{expected}\", found \"{found}\"")]
    HeaderMismatch { expected: String, found: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SalesError>;
