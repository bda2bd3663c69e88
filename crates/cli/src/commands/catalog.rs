//! Catalog browsing commands.

use aviario_core::Product;
use aviario_storefront::{Catalog, CatalogQuery, StorefrontConfig};
use tracing::info;

/// Run one catalog query and print the matching products.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn list(
    config: &StorefrontConfig,
    search: String,
    category: String,
    sort: String,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load_or_builtin(config.catalog_path.as_deref())?;
    let params = CatalogQuery::new()
        .search(search)
        .category(category)
        .sort(sort);

    let results = catalog.query(&params);
    info!(matched = results.len(), of = catalog.len(), "Query complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("Nenhum pássaro encontrado");
        return Ok(());
    }
    for product in &results {
        println!("{}", product_line(product));
    }
    println!("{} produto(s)", results.len());
    Ok(())
}

/// Print every category with its product count.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn categories(config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load_or_builtin(config.catalog_path.as_deref())?;
    for (category, count) in catalog.categories() {
        println!(
            "{} {:<20} {:>3}  ({})",
            category.icon(),
            category.display_name(),
            count,
            category.id()
        );
    }
    Ok(())
}

fn product_line(product: &Product) -> String {
    let mut line = format!(
        "[{}] {} ({}) - {}",
        product.id, product.name, product.species, product.price
    );
    if let Some(discount) = product.discount_percent() {
        line.push_str(&format!(" -{discount}%"));
    }
    if product.featured {
        line.push_str(" *");
    }
    if !product.in_stock {
        line.push_str(" [esgotado]");
    }
    line
}
