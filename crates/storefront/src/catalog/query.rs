//! Search, category filter and sort over a product list.
//!
//! Stages always run in the same order: search, then category, then a
//! stable sort. The input slice is never modified; each call returns a new
//! vector of shared product handles.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aviario_core::{Category, Product};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Category restriction. `all` disables the stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    /// Keep products whose category id equals this string exactly.
    Only(String),
}

impl CategoryFilter {
    const ALL_SENTINEL: &'static str = "all";

    fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => product.category.id() == id.as_str(),
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value == Self::ALL_SENTINEL {
            Self::All
        } else {
            Self::Only(value.to_owned())
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value == Self::ALL_SENTINEL {
            Self::All
        } else {
            Self::Only(value)
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        Self::Only(category.id().to_owned())
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        match filter {
            CategoryFilter::All => CategoryFilter::ALL_SENTINEL.to_owned(),
            CategoryFilter::Only(id) => id,
        }
    }
}

/// Final ordering of the results.
///
/// Unknown keys parse to [`SortKey::Unrecognized`], which leaves the order
/// unchanged rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    /// Featured products first, otherwise catalog order.
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Name,
    Unrecognized(String),
}

impl SortKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Featured => "featured",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Name => "name",
            Self::Unrecognized(raw) => raw,
        }
    }

    fn sort(&self, products: &mut [Arc<Product>]) {
        match self {
            Self::Featured => products.sort_by_key(|p| !p.featured),
            Self::PriceLow => products.sort_by_key(|p| p.price),
            Self::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Name => products.sort_by(|a, b| collate(&a.name, &b.name)),
            Self::Unrecognized(_) => {}
        }
    }
}

impl FromStr for SortKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "featured" => Self::Featured,
            "price-low" => Self::PriceLow,
            "price-high" => Self::PriceHigh,
            "name" => Self::Name,
            other => Self::Unrecognized(other.to_owned()),
        })
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(key) => key,
            Err(never) => match never {},
        }
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.as_str().to_owned()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortKey,
}

impl CatalogQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    #[must_use]
    pub fn category(mut self, filter: impl Into<CategoryFilter>) -> Self {
        self.category = filter.into();
        self
    }

    #[must_use]
    pub fn sort(mut self, key: impl Into<SortKey>) -> Self {
        self.sort = key.into();
        self
    }
}

/// Run the pipeline over `products`.
#[instrument(level = "debug", skip(products), fields(total = products.len()))]
#[must_use]
pub fn query(products: &[Arc<Product>], params: &CatalogQuery) -> Vec<Arc<Product>> {
    // The trimmed text only decides whether the stage runs.
    let needle = (!params.search.trim().is_empty()).then(|| params.search.to_lowercase());

    let mut results: Vec<Arc<Product>> = products
        .iter()
        .filter(|p| needle.as_deref().is_none_or(|n| matches_search(p, n)))
        .filter(|p| params.category.matches(p))
        .cloned()
        .collect();

    params.sort.sort(&mut results);

    debug!(matched = results.len(), "Catalog query evaluated");
    results
}

/// Number of products per category, in [`Category::ALL`] order.
#[must_use]
pub fn category_counts(products: &[Arc<Product>]) -> Vec<(Category, usize)> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let count = products.iter().filter(|p| p.category == category).count();
            (category, count)
        })
        .collect()
}

/// Case-insensitive substring match against the searchable fields.
fn matches_search(product: &Product, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(product.name.as_str())
        || contains(product.species.as_str())
        || contains(product.description.as_str())
        || contains(product.category.id())
        || product.characteristics.iter().any(|c| contains(c.as_str()))
}

/// Accent- and case-insensitive comparison with the raw string as tie-breaker.
///
/// Approximates Portuguese collation: "Ágata" sorts with the A's and
/// "canário" next to "Canario".
fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .cmp(b.chars().flat_map(char::to_lowercase).map(fold_accent))
        .then_with(|| a.cmp(b))
}

const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
