//! Product catalog collaborator.
//!
//! Fetches the product list from the catalog service (or a local JSON copy).
//! The pipeline never calls this itself: the orchestrator fetches once and
//! hands the result, or `None` on failure, to the enrichment matcher.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::error::{Result, SalesError};

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products";

/// One product as exposed by the catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: u32,
    pub title: String,
    pub category: String,
    /// Some products have no brand
    pub brand: Option<String>,
    /// 0.0 - 5.0, absent for unrated products
    pub rating: Option<f64>,
}

/// Wire shape of a product. Every field may be missing or null.
#[derive(Debug, Deserialize)]
struct RawProduct {
    id: Option<u32>,
    title: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    rating: Option<f64>,
}

impl RawProduct {
    fn into_product(self) -> Option<CatalogProduct> {
        Some(CatalogProduct {
            id: self.id?,
            title: self.title.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            brand: self.brand,
            rating: self.rating,
        })
    }
}

/// Product collection, shaped like the service's list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<CatalogProduct>,
    #[serde(default)]
    pub total: Option<usize>,
}

impl Catalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        let total = Some(products.len());
        Catalog { products, total }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&CatalogProduct> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Accepts either `{"products": [...]}` or a bare `[...]`.
///
/// Entries without an id, or that are not product objects at all, are
/// skipped so one bad entry does not cost the whole catalog.
pub fn parse_catalog_json(body: &str) -> Result<Catalog> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    let (entries, total) = match &value {
        serde_json::Value::Array(entries) => (entries, None),
        serde_json::Value::Object(map) => match map.get("products") {
            Some(serde_json::Value::Array(entries)) => (
                entries,
                map.get("total").and_then(|t| t.as_u64()).map(|t| t as usize),
            ),
            _ => {
                return Err(SalesError::Catalog(
                    "expected a 'products' list in the catalog object".to_string(),
                ))
            }
        },
        _ => {
            return Err(SalesError::Catalog(
                "catalog JSON must be a list of products or an object with a 'products' key".to_string(),
            ))
        }
    };

    let mut products = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in entries {
        match serde_json::from_value::<RawProduct>(entry.clone()).ok().and_then(RawProduct::into_product) {
            Some(product) => products.push(product),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped catalog entries without a usable id");
    }

    let total = total.or(Some(products.len()));
    Ok(Catalog { products, total })
}

/// A single product object, as returned by `GET <base_url>/<id>`.
pub fn parse_product_json(body: &str) -> Result<CatalogProduct> {
    let raw: RawProduct = serde_json::from_str(body)?;
    raw.into_product()
        .ok_or_else(|| SalesError::Catalog("catalog product has no id".to_string()))
}

/// Read a catalog from a JSON file on disk (offline mode).
pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    let body = fs::read_to_string(path)?;
    let catalog = parse_catalog_json(&body)?;
    tracing::info!(path = %path.display(), products = catalog.len(), "loaded catalog file");
    Ok(catalog)
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

/// Blocking client for the catalog service.
pub struct CatalogClient {
    base_url: String,
    client: Client,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(CatalogClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `<base_url>?limit=N` (service default page size when `limit` is None).
    pub fn fetch_all(&self, limit: Option<usize>) -> Result<Catalog> {
        let mut request = self.client.get(&self.base_url);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let resp = request.send()?.error_for_status()?;
        let catalog = parse_catalog_json(&resp.text()?)?;

        tracing::info!(url = %self.base_url, products = catalog.len(), "fetched catalog");
        Ok(catalog)
    }

    /// GET `<base_url>/<id>`.
    pub fn fetch_product(&self, id: u32) -> Result<CatalogProduct> {
        let url = format!("{}/{}", self.base_url, id);
        let resp = self.client.get(&url).send()?.error_for_status()?;
        parse_product_json(&resp.text()?)
    }

    /// GET `<base_url>/search?q=<query>`.
    pub fn search(&self, query: &str) -> Result<Catalog> {
        let url = format!("{}/search", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()?
            .error_for_status()?;
        parse_catalog_json(&resp.text()?)
    }
}

/// Fetch the catalog, degrading to `None` on any failure.
///
/// The failure is logged and the run continues without enrichment.
pub fn fetch_or_degrade(client: &CatalogClient, limit: Option<usize>) -> Option<Catalog> {
    match client.fetch_all(limit) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            tracing::warn!(url = %client.base_url(), error = %e, "catalog unavailable, continuing without enrichment");
            None
        }
    }
}

/// Catalog for a run as configured: none when disabled, the offline file
/// when one is set, otherwise the service. Every failure degrades to `None`.
pub fn load_configured_catalog(config: &CatalogConfig) -> Option<Catalog> {
    if config.disabled {
        tracing::info!("enrichment disabled");
        return None;
    }

    if let Some(path) = &config.offline_file {
        return match load_catalog_file(path) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read catalog file");
                None
            }
        };
    }

    match CatalogClient::new(&config.base_url, Duration::from_secs(config.timeout_secs)) {
        Ok(client) => fetch_or_degrade(&client, config.limit),
        Err(e) => {
            tracing::warn!(error = %e, "could not build catalog client");
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SERVICE_BODY: &str = r#"{
        "products": [
            {"id": 1, "title": "Essence Mascara Lash Princess", "category": "beauty", "brand": "Essence", "rating": 4.94, "price": 9.99},
            {"id": 2, "title": "Eyeshadow Palette with Mirror", "category": "beauty", "rating": 3.28}
        ],
        "total": 194,
        "skip": 0,
        "limit": 2
    }"#;

    #[test]
    fn test_parse_service_response() {
        let catalog = parse_catalog_json(SERVICE_BODY).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.total, Some(194));
        assert_eq!(catalog.products[0].brand.as_deref(), Some("Essence"));
        assert_eq!(catalog.products[1].brand, None);
        assert_eq!(catalog.get(2).unwrap().rating, Some(3.28));
    }

    #[test]
    fn test_parse_bare_list() {
        let catalog = parse_catalog_json(r#"[{"id": 7, "title": "Laptop", "category": "laptops", "brand": "Apple", "rating": 4.7}]"#).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.total, Some(1));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(matches!(parse_catalog_json(r#"{"items": []}"#), Err(SalesError::Catalog(_))));
        assert!(matches!(parse_catalog_json("42"), Err(SalesError::Catalog(_))));
        assert!(matches!(parse_catalog_json("not json"), Err(SalesError::Json(_))));
    }

    #[test]
    fn test_bad_entries_are_skipped_not_fatal() {
        let body = r#"{"products": [
            {"id": 1, "title": "Laptop", "category": "laptops", "rating": null},
            {"title": "No Id Product", "category": "misc", "rating": 4.0},
            "not a product",
            {"id": 3, "title": "Mouse"}
        ]}"#;

        let catalog = parse_catalog_json(body).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().rating, None);
        let mouse = catalog.get(3).unwrap();
        assert_eq!(mouse.category, "");
        assert_eq!(mouse.brand, None);
    }

    #[test]
    fn test_parse_single_product() {
        let product = parse_product_json(
            r#"{"id": 101, "title": "Laptop", "category": "laptops", "brand": "Apple", "rating": 4.7, "stock": 12}"#,
        )
        .unwrap();
        assert_eq!(product.id, 101);
        assert_eq!(product.brand.as_deref(), Some("Apple"));

        assert!(matches!(parse_product_json(r#"{"title": "Laptop"}"#), Err(SalesError::Catalog(_))));
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"{"products": [{"id": 78, "title": "Apple MacBook Pro", "category": "laptops", "brand": "Apple", "rating": 4.65}], "total": 1, "skip": 0, "limit": 30}"#;

        let catalog = parse_catalog_json(body).unwrap();
        assert_eq!(catalog.total, Some(1));
        assert_eq!(catalog.products[0].title, "Apple MacBook Pro");
    }

    #[test]
    fn test_load_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SERVICE_BODY.as_bytes()).unwrap();

        let catalog = load_catalog_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_unreachable_service_degrades_to_none() {
        // Port 9 (discard) on localhost: connection refused or timeout, never a catalog
        let client = CatalogClient::new("http://127.0.0.1:9/products", Duration::from_millis(200)).unwrap();
        assert!(fetch_or_degrade(&client, Some(5)).is_none());
        assert!(client.fetch_product(1).is_err());
        assert!(client.search("laptop").is_err());
    }

    #[test]
    fn test_configured_catalog_sources() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SERVICE_BODY.as_bytes()).unwrap();

        let offline = CatalogConfig {
            offline_file: Some(file.path().to_path_buf()),
            ..CatalogConfig::default()
        };
        assert_eq!(load_configured_catalog(&offline).map(|c| c.len()), Some(2));

        let disabled = CatalogConfig {
            disabled: true,
            ..offline.clone()
        };
        assert!(load_configured_catalog(&disabled).is_none());

        let missing_file = CatalogConfig {
            offline_file: Some("no/such/catalog.json".into()),
            ..CatalogConfig::default()
        };
        assert!(load_configured_catalog(&missing_file).is_none());

        let unreachable = CatalogConfig {
            base_url: "http://127.0.0.1:9/products".to_string(),
            timeout_secs: 1,
            ..CatalogConfig::default()
        };
        assert!(load_configured_catalog(&unreachable).is_none());
    }
}
