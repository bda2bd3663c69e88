//! Favorites list: a set of products keyed by id, kept in insertion order.

use std::sync::Arc;

use aviario_core::{Product, ProductId};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, instrument};

/// Snapshot of the favorites set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Favorites {
    products: Vec<Arc<Product>>,
}

impl Favorites {
    /// Products in the order they were first liked.
    #[must_use]
    pub fn products(&self) -> &[Arc<Product>] {
        &self.products
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.products.iter().any(|p| &p.id == product_id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Returns true if the product was inserted.
    fn insert(&mut self, product: Arc<Product>) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Returns true if a product was removed.
    fn delete(&mut self, product_id: &ProductId) -> bool {
        let before = self.products.len();
        self.products.retain(|p| &p.id != product_id);
        self.products.len() != before
    }
}

/// Owner of the session favorites.
#[derive(Debug)]
pub struct FavoritesStore {
    state: watch::Sender<Favorites>,
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesStore {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(Favorites::default());
        Self { state }
    }

    /// Add a product; no-op if it is already a favorite.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&mut self, product: Arc<Product>) {
        self.state.send_if_modified(|favorites| favorites.insert(product));
    }

    /// Remove a product; no-op if it is not a favorite.
    #[instrument(skip(self))]
    pub fn remove(&mut self, product_id: &ProductId) {
        self.state
            .send_if_modified(|favorites| favorites.delete(product_id));
    }

    /// Flip membership and return whether the product is now a favorite.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn toggle(&mut self, product: Arc<Product>) -> bool {
        let mut liked = false;
        self.state.send_modify(|favorites| {
            if !favorites.delete(&product.id) {
                liked = favorites.insert(product);
            }
        });
        debug!(liked, count = self.count(), "Favorite toggled");
        liked
    }

    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        self.state.send_if_modified(|favorites| {
            let had_any = !favorites.is_empty();
            favorites.products.clear();
            had_any
        });
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.state.borrow().contains(product_id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.state.borrow().count()
    }

    /// A copy of the current favorites.
    #[must_use]
    pub fn snapshot(&self) -> Favorites {
        self.state.borrow().clone()
    }

    /// Receive every favorites set published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Favorites> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aviario_core::{Category, Price, Sex};

    use super::*;

    fn bird(id: &str) -> Arc<Product> {
        Arc::new(Product {
            id: ProductId::new(id),
            name: format!("Calopsita {id}"),
            species: "Nymphicus hollandicus".to_string(),
            description: String::new(),
            price: Price::from_cents(35000),
            original_price: None,
            images: vec![],
            category: Category::Calopsitas,
            age: "6-8 meses".to_string(),
            sex: Sex::Femea,
            in_stock: true,
            featured: true,
            characteristics: vec![],
            care: vec![],
        })
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = FavoritesStore::new();
        store.add(bird("1"));
        store.add(bird("1"));
        assert_eq!(store.count(), 1);
        assert!(store.contains(&ProductId::new("1")));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = FavoritesStore::new();
        store.add(bird("1"));
        store.remove(&ProductId::new("2"));
        assert_eq!(store.count(), 1);
        store.remove(&ProductId::new("1"));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut store = FavoritesStore::new();
        let p = bird("1");

        assert!(store.toggle(p.clone()));
        assert!(store.contains(&p.id));
        assert!(!store.toggle(p.clone()));
        assert!(!store.contains(&p.id));

        store.add(bird("2"));
        let before = store.snapshot();
        store.toggle(p.clone());
        store.toggle(p);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = FavoritesStore::new();
        for id in ["3", "1", "2"] {
            store.add(bird(id));
        }
        store.add(bird("1"));
        let ids: Vec<String> = store
            .snapshot()
            .products()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }

    #[test]
    fn test_clear_from_any_state() {
        let mut store = FavoritesStore::new();
        store.clear();
        assert_eq!(store.count(), 0);
        store.add(bird("1"));
        store.add(bird("2"));
        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_noop_does_not_notify() {
        let mut store = FavoritesStore::new();
        store.add(bird("1"));
        let mut rx = store.subscribe();

        store.add(bird("1"));
        assert!(!rx.has_changed().unwrap());

        store.remove(&ProductId::new("1"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }
}
