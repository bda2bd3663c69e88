//! Integration tests for the Aviário storefront.
//!
//! The tests drive a whole [`Storefront`](aviario_storefront::Storefront)
//! session against the built-in catalog, the way a presentation layer would.
//! Nothing external is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aviario-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_and_favorites` - Store commands and snapshot observers
//! - `catalog_query` - Search, category and sort pipeline over real data
//! - `checkout_session` - Checkout flow through order placement
