//! Product catalog.
//!
//! The catalog is read-only reference data: a list of products in display
//! order plus the fixed category enumeration. It is loaded once, either from
//! the built-in data set or from a JSON/YAML file, and shared with the cart
//! and favorites through `Arc<Product>`.

mod query;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aviario_core::{Category, Product, ProductId};
use thiserror::Error;
use tracing::{info, instrument};

pub use query::{CatalogQuery, CategoryFilter, SortKey, category_counts, query};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),
    #[error("unsupported catalog format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

/// The product list offered by the store.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Arc<Product>>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self {
            products: products.into_iter().map(Arc::new).collect(),
        })
    }

    /// The six-bird catalog shipped with the storefront.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded data is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON, negative prices or duplicate ids.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Parse a YAML sequence of products.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML, negative prices or duplicate ids.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Self::new(serde_yaml::from_str(yaml)?)
    }

    /// Load a catalog file, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unknown extension,
    /// or does not parse.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, CatalogError> = match extension.as_deref() {
            Some("json") => Self::from_json,
            Some("yaml" | "yml") => Self::from_yaml,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };

        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = parse(&content)?;
        info!(products = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Load from `path` if given, otherwise the built-in catalog.
    ///
    /// # Errors
    ///
    /// See [`Catalog::load`].
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        path.map_or_else(Self::builtin, Self::load)
    }

    /// Products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Arc<Product>] {
        &self.products
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&Arc<Product>> {
        self.products.iter().find(|p| &p.id == product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Every category with the number of catalog products in it.
    #[must_use]
    pub fn categories(&self) -> Vec<(Category, usize)> {
        category_counts(&self.products)
    }

    /// Run the search/filter/sort pipeline over this catalog.
    #[must_use]
    pub fn query(&self, params: &CatalogQuery) -> Vec<Arc<Product>> {
        query(&self.products, params)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 6);

        let belga = catalog.get(&ProductId::new("1")).unwrap();
        assert_eq!(belga.name, "Canário Belga Amarelo");
        assert_eq!(belga.discount_percent(), Some(18));
    }

    #[test]
    fn test_builtin_category_counts() {
        let catalog = Catalog::builtin().unwrap();
        let counts = catalog.categories();
        assert_eq!(counts.len(), Category::ALL.len());
        assert_eq!(counts.first(), Some(&(Category::Canarios, 2)));
        assert_eq!(counts.last(), Some(&(Category::Acessorios, 0)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let catalog = Catalog::builtin().unwrap();
        let mut products: Vec<Product> =
            catalog.products().iter().map(|p| (**p).clone()).collect();
        products.push(products.first().unwrap().clone());

        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::DuplicateId(id)) if id.as_str() == "1"
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let json = r#"[{
            "id": "x", "name": "X", "species": "x", "description": "",
            "price": "-1.00", "category": "acessórios", "age": "",
            "sex": "não-definido", "inStock": true
        }]"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
- id: gaiola-1
  name: Gaiola Grande
  species: n/a
  description: Gaiola para calopsitas
  price: '199.90'
  category: acessórios
  age: n/a
  sex: não-definido
  inStock: false
";
        let catalog = Catalog::from_yaml(yaml).unwrap();
        let cage = catalog.get(&ProductId::new("gaiola-1")).unwrap();
        assert_eq!(cage.category, Category::Acessorios);
        assert!(!cage.in_stock);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let result = Catalog::load(Path::new("catalog.csv"));
        assert!(matches!(result, Err(CatalogError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/nonexistent/aviario/catalog.json"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
