//! Session-level error type.
//!
//! The cart and favorites reducers are total and never fail. Errors only
//! arise where the session resolves ids against the catalog, applies the
//! stock policy, or drives checkout.

use aviario_core::ProductId;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;

/// Error type for [`Storefront`](crate::Storefront) operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Loading or parsing the catalog failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout validation or submission failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// No product with this id exists in the catalog.
    #[error("Not found: {0}")]
    NotFound(ProductId),

    /// The product is out of stock and the session blocks such additions.
    #[error("Out of stock: {0}")]
    OutOfStock(ProductId),
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
