//! Aviário Storefront library.
//!
//! In-memory state for one shopping session: the product catalog and its
//! query pipeline, the cart, the favorites list, and the simulated checkout.
//! Nothing is persisted; dropping a [`Storefront`] discards the session.
//!
//! # Modules
//!
//! - [`cart`] - Cart reducer and observable cart store
//! - [`favorites`] - Favorites set and observable favorites store
//! - [`catalog`] - Static product data and the search/filter/sort pipeline
//! - [`checkout`] - Three-step checkout form and simulated order submission
//! - [`session`] - Facade composing the stores for a presentation layer
//! - [`config`] - Environment-driven settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod session;

pub use cart::{Cart, CartCommand, CartLine, CartStore, Installment};
pub use catalog::{Catalog, CatalogError, CatalogQuery, CategoryFilter, SortKey};
pub use checkout::{
    AddressForm, CheckoutError, CheckoutFlow, CheckoutStep, CustomerForm, Order, PaymentForm,
};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{Result, StorefrontError};
pub use favorites::{Favorites, FavoritesStore};
pub use session::Storefront;
