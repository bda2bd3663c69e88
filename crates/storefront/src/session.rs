//! One shopping session: catalog, cart and favorites behind a single facade.
//!
//! Presentation layers talk to [`Storefront`] with product ids; the session
//! resolves them against the catalog before touching the stores.

use std::sync::Arc;

use aviario_core::{Product, ProductId};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::cart::{CartStore, Installment};
use crate::catalog::{Catalog, CatalogQuery};
use crate::checkout::{CheckoutFlow, Order};
use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError};
use crate::favorites::FavoritesStore;

/// The state of one storefront session.
#[derive(Debug)]
pub struct Storefront {
    catalog: Catalog,
    cart: CartStore,
    favorites: FavoritesStore,
    config: StorefrontConfig,
}

impl Storefront {
    #[must_use]
    pub fn new(catalog: Catalog, config: StorefrontConfig) -> Self {
        Self {
            catalog,
            cart: CartStore::new(),
            favorites: FavoritesStore::new(),
            config,
        }
    }

    /// Open a session with the catalog named by `config`, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured catalog file cannot be loaded.
    #[instrument(skip(config), fields(catalog_path = ?config.catalog_path))]
    pub fn from_config(config: StorefrontConfig) -> Result<Self> {
        let catalog = Catalog::load_or_builtin(config.catalog_path.as_deref())?;
        info!(products = catalog.len(), "Storefront session opened");
        Ok(Self::new(catalog, config))
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Run a catalog query.
    #[must_use]
    pub fn query(&self, params: &CatalogQuery) -> Vec<Arc<Product>> {
        self.catalog.query(params)
    }

    /// A checkout flow using this session's installment limit.
    #[must_use]
    pub fn checkout(&self) -> CheckoutFlow {
        CheckoutFlow::new(self.config.max_installments)
    }

    fn resolve(&self, product_id: &ProductId) -> Result<Arc<Product>> {
        self.catalog
            .get(product_id)
            .cloned()
            .ok_or_else(|| StorefrontError::NotFound(product_id.clone()))
    }

    fn ensure_purchasable(&self, product: &Product) -> Result<()> {
        if self.config.block_out_of_stock && !product.in_stock {
            warn!(product_id = %product.id, "Rejected out-of-stock product");
            return Err(StorefrontError::OutOfStock(product.id.clone()));
        }
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` units of a catalog product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::NotFound`] for an unknown id and
    /// [`StorefrontError::OutOfStock`] when stock is enforced.
    #[instrument(skip(self))]
    pub fn add_to_cart(&mut self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let product = self.resolve(product_id)?;
        self.ensure_purchasable(&product)?;
        self.cart.add_item(product, quantity);
        Ok(())
    }

    pub fn remove_from_cart(&mut self, product_id: &ProductId) {
        self.cart.remove_item(product_id);
    }

    /// Set a line's quantity; zero or below removes it.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.cart.update_quantity(product_id, quantity);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// How much more the cart needs for free shipping, zero once reached.
    #[must_use]
    pub fn free_shipping_remaining(&self) -> Decimal {
        self.cart
            .snapshot()
            .free_shipping_remaining(self.config.free_shipping_threshold)
    }

    #[must_use]
    pub fn installment_options(&self) -> Vec<Installment> {
        self.cart
            .snapshot()
            .installment_options(self.config.max_installments)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Flip a product's favorite status; returns whether it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::NotFound`] for an unknown id.
    pub fn toggle_favorite(&mut self, product_id: &ProductId) -> Result<bool> {
        let product = self.resolve(product_id)?;
        Ok(self.favorites.toggle(product))
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::NotFound`] for an unknown id.
    pub fn add_favorite(&mut self, product_id: &ProductId) -> Result<()> {
        let product = self.resolve(product_id)?;
        self.favorites.add(product);
        Ok(())
    }

    pub fn remove_favorite(&mut self, product_id: &ProductId) {
        self.favorites.remove(product_id);
    }

    pub fn clear_favorites(&mut self) {
        self.favorites.clear();
    }

    #[must_use]
    pub fn is_favorite(&self, product_id: &ProductId) -> bool {
        self.favorites.contains(product_id)
    }

    /// Add one unit of every favorite to the cart. Favorites stay in place.
    ///
    /// Products blocked by the stock policy are skipped. Returns how many
    /// products were added.
    #[instrument(skip(self))]
    pub fn add_all_favorites_to_cart(&mut self) -> usize {
        let favorites = self.favorites.snapshot();
        let mut added = 0;
        for product in favorites.products() {
            if self.ensure_purchasable(product).is_err() {
                continue;
            }
            self.cart.add_item(Arc::clone(product), 1);
            added += 1;
        }
        info!(added, skipped = favorites.count() - added, "Favorites moved to cart");
        added
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submit `flow` against the current cart and empty the cart on success.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Checkout`] if the flow rejects the
    /// submission; the cart is left untouched in that case.
    pub async fn place_order(&mut self, flow: &mut CheckoutFlow) -> Result<Order> {
        let cart = self.cart.snapshot();
        let order = flow.submit(&cart, self.config.checkout_delay).await?;
        self.cart.clear();
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::checkout::{AddressForm, CustomerForm, PaymentForm};

    /// Built-in catalog with product "6" marked out of stock.
    fn session(block_out_of_stock: bool) -> Storefront {
        let products = Catalog::builtin()
            .unwrap()
            .products()
            .iter()
            .map(|p| {
                let mut product = Product::clone(p);
                product.in_stock = product.id.as_str() != "6";
                product
            })
            .collect();
        let config = StorefrontConfig {
            checkout_delay: Duration::from_millis(50),
            block_out_of_stock,
            ..StorefrontConfig::default()
        };
        Storefront::new(Catalog::new(products).unwrap(), config)
    }

    fn out_of_stock_id(store: &Storefront) -> ProductId {
        store
            .catalog()
            .products()
            .iter()
            .find(|p| !p.in_stock)
            .map(|p| p.id.clone())
            .unwrap()
    }

    #[test]
    fn test_add_unknown_product() {
        let mut store = session(false);
        let result = store.add_to_cart(&ProductId::new("999"), 1);
        assert!(matches!(result, Err(StorefrontError::NotFound(_))));
        assert_eq!(store.cart().item_count(), 0);
    }

    #[test]
    fn test_stock_policy() {
        let mut permissive = session(false);
        let id = out_of_stock_id(&permissive);
        permissive.add_to_cart(&id, 1).unwrap();
        assert_eq!(permissive.cart().quantity_of(&id), Some(1));

        let mut strict = session(true);
        assert!(matches!(
            strict.add_to_cart(&id, 1),
            Err(StorefrontError::OutOfStock(_))
        ));
    }

    #[test]
    fn test_free_shipping_and_installments() {
        let mut store = session(false);
        assert_eq!(store.free_shipping_remaining(), Decimal::new(500, 0));

        store.add_to_cart(&ProductId::new("1"), 2).unwrap();
        assert_eq!(store.free_shipping_remaining(), Decimal::new(140, 0));

        let options = store.installment_options();
        assert_eq!(options.len(), 12);
        assert_eq!(options.first().unwrap().amount, Decimal::new(360, 0));
    }

    #[test]
    fn test_favorites_to_cart_skips_blocked() {
        let mut store = session(true);
        let blocked = out_of_stock_id(&store);
        store.add_favorite(&ProductId::new("1")).unwrap();
        store.add_favorite(&blocked).unwrap();

        assert_eq!(store.add_all_favorites_to_cart(), 1);
        assert_eq!(store.cart().quantity_of(&ProductId::new("1")), Some(1));
        assert_eq!(store.cart().quantity_of(&blocked), None);
        assert_eq!(store.favorites().count(), 2);
    }

    #[test]
    fn test_toggle_favorite_unknown() {
        let mut store = session(false);
        assert!(store.toggle_favorite(&ProductId::new("1")).unwrap());
        assert!(store.is_favorite(&ProductId::new("1")));
        assert!(matches!(
            store.toggle_favorite(&ProductId::new("nope")),
            Err(StorefrontError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_place_order_clears_cart() {
        let mut store = session(false);
        store.add_to_cart(&ProductId::new("1"), 1).unwrap();

        let mut flow = store.checkout();
        flow.customer = CustomerForm {
            name: "João Souza".to_string(),
            email: "joao@exemplo.com".to_string(),
            phone: "11987654321".to_string(),
            cpf: "52998224725".to_string(),
        };
        flow.address = AddressForm {
            street: "Av. Paulista".to_string(),
            number: "1000".to_string(),
            complement: "ap 12".to_string(),
            neighborhood: "Bela Vista".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            zip_code: "01310100".to_string(),
        };
        flow.payment = PaymentForm {
            card_number: SecretString::from("5555555555554444".to_string()),
            card_name: "JOAO SOUZA".to_string(),
            expiry: "01/99".to_string(),
            cvv: SecretString::from("321".to_string()),
            installments: 1,
        };
        flow.next().unwrap();
        flow.next().unwrap();

        let order = store.place_order(&mut flow).await.unwrap();
        assert_eq!(order.total, Decimal::new(180, 0));
        assert!(store.cart().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let mut store = session(false);
        store.add_to_cart(&ProductId::new("1"), 1).unwrap();

        let mut flow = store.checkout();
        let result = store.place_order(&mut flow).await;
        assert!(matches!(result, Err(StorefrontError::Checkout(_))));
        assert_eq!(store.cart().item_count(), 1);
    }
}
