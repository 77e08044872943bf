//! Product catalog: loading, memoization and filtering
//!
//! The catalog is fetched once per process. Concurrent first callers share
//! a single in-flight load, and a failed load is cached like a successful
//! one; there is no automatic retry.

pub mod source;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::CatalogLoadError;
use source::CatalogSource;

pub type ProductId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Category exact match AND case-insensitive substring on name/brand/description.
    /// Empty `category` or `query` disables that axis.
    pub fn matches(&self, category: &str, query: &str) -> bool {
        if !category.is_empty() && self.category != category {
            return false;
        }
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.brand.to_lowercase().contains(&q)
            || self.description.to_lowercase().contains(&q)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    products: Vec<Product>,
}

/// Deduplicated product list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, keeping the first product for each name
    pub fn new(products: Vec<Product>) -> Self {
        let mut seen = HashSet::new();
        let products = products
            .into_iter()
            .filter(|p| seen.insert(p.name.clone()))
            .collect();
        Self { products }
    }

    pub fn parse(raw: &str) -> Result<Self, CatalogLoadError> {
        let doc: CatalogDocument =
            serde_json::from_str(raw).map_err(|e| CatalogLoadError::Parse(e.to_string()))?;
        Ok(Self::new(doc.products))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn filter(&self, category: &str, query: &str) -> Vec<&Product> {
        filter(self.products(), category, query)
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.products
            .iter()
            .filter(|p| seen.insert(p.category.as_str()))
            .map(|p| p.category.clone())
            .collect()
    }
}

pub fn filter<'a>(products: &'a [Product], category: &str, query: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.matches(category, query)).collect()
}

/// Display label for a category ("cleanser" -> "Cleanser")
pub fn category_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Owns the memoized catalog for the process lifetime
pub struct CatalogStore {
    source: Box<dyn CatalogSource>,
    cell: OnceCell<Result<Arc<Catalog>, CatalogLoadError>>,
}

impl CatalogStore {
    pub fn new(source: Box<dyn CatalogSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Load the catalog. Only the first call (or the first of several
    /// concurrent calls) hits the source.
    pub async fn load(&self) -> Result<Arc<Catalog>, CatalogLoadError> {
        self.cell
            .get_or_init(|| async {
                tracing::info!("Loading product catalog from {}", self.source.describe());
                let loaded = self
                    .source
                    .fetch()
                    .await
                    .and_then(|raw| Catalog::parse(&raw))
                    .map(Arc::new);
                match &loaded {
                    Ok(catalog) => tracing::info!("Catalog loaded: {} products", catalog.len()),
                    Err(e) => tracing::error!("Catalog load failed: {}", e),
                }
                loaded
            })
            .await
            .clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub(crate) fn product(id: ProductId, name: &str, brand: &str, category: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            brand: brand.to_string(),
            category: category.to_string(),
            description: format!("{} by {}", name, brand),
            image: format!("https://img.example.com/{}.png", id),
        }
    }

    pub(crate) fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            product(1, "Foaming Cleanser", "CeraVe", "cleanser"),
            product(2, "Hydrating Serum", "La Roche-Posay", "skincare"),
            product(3, "Night Cream", "Garnier", "moisturizer"),
            product(4, "Gentle Cleanser", "Cetaphil", "cleanser"),
            product(5, "Revitalift Serum", "L'Oréal Paris", "skincare"),
        ])
    }

    /// Serves a fixed document
    pub(crate) struct StaticSource(pub String);

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch(&self) -> Result<String, CatalogLoadError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    /// Store pre-seeded with `sample_catalog` products
    pub(crate) fn sample_store() -> CatalogStore {
        let products = sample_catalog().products().to_vec();
        let raw = serde_json::json!({ "products": products }).to_string();
        CatalogStore::new(Box::new(StaticSource(raw)))
    }

    struct CountingSource {
        body: Result<String, CatalogLoadError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn fetch(&self) -> Result<String, CatalogLoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.body.clone()
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn test_dedup_by_name_first_wins() {
        let catalog = Catalog::new(vec![
            product(1, "Serum", "A", "skincare"),
            product(2, "Serum", "B", "skincare"),
            product(3, "Toner", "C", "skincare"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find(1).unwrap().brand, "A");
        assert!(catalog.find(2).is_none());
    }

    #[test]
    fn test_empty_filter_returns_full_catalog() {
        let catalog = sample_catalog();
        let all: Vec<Product> = catalog.filter("", "").into_iter().cloned().collect();
        assert_eq!(all, catalog.products());
    }

    #[test]
    fn test_filter_category_and_search() {
        let catalog = sample_catalog();
        let names: Vec<&str> = catalog
            .filter("cleanser", "GENTLE")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Gentle Cleanser"]);

        // brand and description also match
        assert_eq!(catalog.filter("", "garnier").len(), 1);
        assert_eq!(catalog.filter("", "  serum ").len(), 2);
        assert!(catalog.filter("makeup", "").is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let catalog = sample_catalog();
        let once: Vec<Product> = catalog.filter("skincare", "serum").into_iter().cloned().collect();
        let twice: Vec<Product> = filter(&once, "skincare", "serum").into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let catalog = sample_catalog();
        assert_eq!(catalog.categories(), vec!["cleanser", "skincare", "moisturizer"]);
        assert_eq!(category_label("moisturizer"), "Moisturizer");
        assert_eq!(category_label(""), "");
    }

    #[test]
    fn test_parse_missing_optional_fields() {
        let raw = r#"{"products": [{"id": 7, "name": "Mask", "category": "skincare"}]}"#;
        let catalog = Catalog::parse(raw).unwrap();
        assert_eq!(catalog.find(7).unwrap().brand, "");

        assert!(matches!(Catalog::parse("not json"), Err(CatalogLoadError::Parse(_))));
        assert!(Catalog::parse("{}").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = CatalogStore::new(Box::new(CountingSource {
            body: Ok(r#"{"products": [{"id": 1, "name": "Mask", "category": "skincare"}]}"#
                .to_string()),
            calls: calls.clone(),
        }));

        let (a, b) = tokio::join!(store.load(), store.load());
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
        store.load().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = CatalogStore::new(Box::new(CountingSource {
            body: Err(CatalogLoadError::Fetch("offline".to_string())),
            calls: calls.clone(),
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let first = store.load().await;
        let second = store.load().await;
        assert_eq!(first, second);
        assert!(matches!(second, Err(CatalogLoadError::Fetch(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
