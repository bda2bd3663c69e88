//! Shopping cart.
//!
//! [`Cart`] is an immutable value transformed by [`CartCommand`]s; every
//! transform recomputes the total from the lines, so the total can never
//! drift. [`CartStore`] holds the current snapshot and publishes each new
//! one through a `tokio::sync::watch` channel.

use std::sync::Arc;

use aviario_core::{Product, ProductId};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, instrument};

/// A product and how many units of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    product: Arc<Product>,
    quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn product(&self) -> &Arc<Product> {
        &self.product
    }

    /// Always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price.times(self.quantity)
    }
}

/// One way of splitting the cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Installment {
    /// Number of payments.
    pub count: u32,
    /// Amount of each payment, rounded to centavos.
    pub amount: Decimal,
}

/// A mutation of the cart.
#[derive(Debug, Clone)]
pub enum CartCommand {
    /// Add `quantity` units, merging into an existing line for the same product.
    Add {
        product: Arc<Product>,
        quantity: u32,
    },
    /// Drop the line for this product.
    Remove(ProductId),
    /// Set the quantity of an existing line; zero or less removes it.
    UpdateQuantity {
        product_id: ProductId,
        quantity: i64,
    },
    /// Remove every line.
    Clear,
}

/// Snapshot of the cart: lines in first-added order plus the derived total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    total: Decimal,
}

impl Cart {
    /// Produce the cart that results from applying `command`.
    ///
    /// Total for all inputs: unknown product ids and zero additions leave
    /// the lines untouched.
    #[must_use]
    pub fn apply(mut self, command: CartCommand) -> Self {
        match command {
            CartCommand::Add { product, quantity } => {
                if quantity > 0 {
                    if let Some(line) = self.line_mut(&product.id) {
                        line.quantity = line.quantity.saturating_add(quantity);
                    } else {
                        self.lines.push(CartLine { product, quantity });
                    }
                }
            }
            CartCommand::Remove(product_id) => {
                self.lines.retain(|line| line.product.id != product_id);
            }
            CartCommand::UpdateQuantity {
                product_id,
                quantity,
            } => match u32::try_from(quantity) {
                Ok(quantity) if quantity > 0 => {
                    if let Some(line) = self.line_mut(&product_id) {
                        line.quantity = quantity;
                    }
                }
                // Quantities above u32::MAX cannot be represented; keep the line as is.
                Err(_) if quantity > 0 => {}
                _ => self.lines.retain(|line| line.product.id != product_id),
            },
            CartCommand::Clear => self.lines.clear(),
        }
        self.total = self.lines.iter().map(CartLine::subtotal).sum();
        self
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product.id == product_id)
    }

    /// Sum of every line's price times quantity.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// How much more must be added to reach `threshold`; zero once reached.
    #[must_use]
    pub fn free_shipping_remaining(&self, threshold: Decimal) -> Decimal {
        (threshold - self.total).max(Decimal::ZERO)
    }

    /// Per-payment amounts for 1 through `max` installments.
    #[must_use]
    pub fn installment_options(&self, max: u32) -> Vec<Installment> {
        (1..=max)
            .map(|count| Installment {
                count,
                amount: installment_amount(self.total, count),
            })
            .collect()
    }
}

/// `total / count` rounded half away from zero to centavos.
pub(crate) fn installment_amount(total: Decimal, count: u32) -> Decimal {
    if count == 0 {
        return total;
    }
    (total / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Owner of the session cart.
///
/// Commands take `&mut self`, so there is a single writer. Readers either
/// take a [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe) to
/// be notified of every new cart; a subscriber only ever sees whole carts.
#[derive(Debug)]
pub struct CartStore {
    state: watch::Sender<Cart>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create a store holding an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(Cart::default());
        Self { state }
    }

    /// Apply a command and publish the resulting cart.
    pub fn dispatch(&mut self, command: CartCommand) {
        self.state.send_modify(|cart| {
            let current = std::mem::take(cart);
            *cart = current.apply(command);
        });
        let cart = self.state.borrow();
        debug!(
            lines = cart.lines().len(),
            items = cart.item_count(),
            total = %cart.total(),
            "Cart updated"
        );
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&mut self, product: Arc<Product>, quantity: u32) {
        self.dispatch(CartCommand::Add { product, quantity });
    }

    #[instrument(skip(self))]
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.dispatch(CartCommand::Remove(product_id.clone()));
    }

    #[instrument(skip(self))]
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.dispatch(CartCommand::UpdateQuantity {
            product_id: product_id.clone(),
            quantity,
        });
    }

    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        self.dispatch(CartCommand::Clear);
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.borrow().item_count()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state.borrow().total()
    }

    /// Quantity of a product in the cart, if present.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state.borrow().line(product_id).map(CartLine::quantity)
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Receive every cart published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aviario_core::{Category, Price, Sex};

    use super::*;

    fn bird(id: &str, cents: u32) -> Arc<Product> {
        Arc::new(Product {
            id: ProductId::new(id),
            name: format!("Pássaro {id}"),
            species: "Serinus canaria".to_string(),
            description: String::new(),
            price: Price::from_cents(cents),
            original_price: None,
            images: vec![],
            category: Category::Canarios,
            age: "1 ano".to_string(),
            sex: Sex::Macho,
            in_stock: true,
            featured: false,
            characteristics: vec![],
            care: vec![],
        })
    }

    fn assert_total_consistent(cart: &Cart) {
        let expected: Decimal = cart
            .lines()
            .iter()
            .map(|l| l.product().price.amount() * Decimal::from(l.quantity()))
            .sum();
        assert_eq!(cart.total(), expected);
    }

    #[test]
    fn test_add_merges_same_product() {
        let a = bird("a", 18000);
        let b = bird("b", 35000);
        let mut store = CartStore::new();

        store.add_item(a.clone(), 1);
        let cart = store.snapshot();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total(), Decimal::new(180, 0));

        store.add_item(a.clone(), 2);
        let cart = store.snapshot();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&a.id).unwrap().quantity(), 3);
        assert_eq!(cart.total(), Decimal::new(540, 0));

        store.add_item(b.clone(), 1);
        assert_eq!(store.snapshot().lines().len(), 2);

        store.remove_item(&a.id);
        let cart = store.snapshot();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines().first().unwrap().product().id, b.id);
        assert_total_consistent(&cart);
    }

    #[test]
    fn test_lines_keep_first_added_order() {
        let mut cart = Cart::default();
        for id in ["c", "a", "b"] {
            cart = cart.apply(CartCommand::Add {
                product: bird(id, 100),
                quantity: 1,
            });
        }
        cart = cart.apply(CartCommand::Add {
            product: bird("a", 100),
            quantity: 4,
        });

        let ids: Vec<&str> = cart.lines().iter().map(|l| l.product().id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let cart = Cart::default().apply(CartCommand::Add {
            product: bird("a", 100),
            quantity: 0,
        });
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_is_not_additive() {
        let a = bird("a", 12000);
        let mut store = CartStore::new();
        store.add_item(a.clone(), 5);
        store.update_quantity(&a.id, 2);

        assert_eq!(store.quantity_of(&a.id), Some(2));
        assert_eq!(store.total(), Decimal::new(240, 0));
    }

    #[test]
    fn test_update_to_zero_or_negative_equals_remove() {
        let a = bird("a", 12000);
        let b = bird("b", 25000);
        let base = Cart::default()
            .apply(CartCommand::Add {
                product: a.clone(),
                quantity: 2,
            })
            .apply(CartCommand::Add {
                product: b,
                quantity: 1,
            });

        let removed = base.clone().apply(CartCommand::Remove(a.id.clone()));
        for quantity in [0, -5] {
            let updated = base.clone().apply(CartCommand::UpdateQuantity {
                product_id: a.id.clone(),
                quantity,
            });
            assert_eq!(updated, removed);
        }
    }

    #[test]
    fn test_absent_ids_are_noops() {
        let a = bird("a", 12000);
        let cart = Cart::default().apply(CartCommand::Add {
            product: a,
            quantity: 1,
        });
        let missing = ProductId::new("missing");

        assert_eq!(cart.clone().apply(CartCommand::Remove(missing.clone())), cart);
        assert_eq!(
            cart.clone().apply(CartCommand::UpdateQuantity {
                product_id: missing,
                quantity: 9,
            }),
            cart
        );
    }

    #[test]
    fn test_clear_from_any_state() {
        let mut store = CartStore::new();
        store.clear();
        assert_eq!(store.item_count(), 0);

        store.add_item(bird("a", 100), 3);
        store.add_item(bird("b", 200), 1);
        store.clear();
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.total(), Decimal::ZERO);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut store = CartStore::new();
        assert_eq!(store.item_count(), 0);
        store.add_item(bird("a", 100), 3);
        store.add_item(bird("b", 100), 2);
        assert_eq!(store.item_count(), 5);
    }

    #[test]
    fn test_total_invariant_after_every_mutation() {
        let a = bird("a", 18000);
        let b = bird("b", 1999);
        let commands = vec![
            CartCommand::Add {
                product: a.clone(),
                quantity: 2,
            },
            CartCommand::Add {
                product: b.clone(),
                quantity: 3,
            },
            CartCommand::UpdateQuantity {
                product_id: b.id.clone(),
                quantity: 7,
            },
            CartCommand::Remove(a.id.clone()),
            CartCommand::Add {
                product: a,
                quantity: 1,
            },
            CartCommand::UpdateQuantity {
                product_id: b.id.clone(),
                quantity: -1,
            },
            CartCommand::Clear,
        ];

        let mut cart = Cart::default();
        for command in commands {
            cart = cart.apply(command);
            assert_total_consistent(&cart);
        }
    }

    #[test]
    fn test_subscriber_sees_whole_snapshots() {
        let a = bird("a", 18000);
        let mut store = CartStore::new();
        let mut rx = store.subscribe();

        store.add_item(a.clone(), 2);
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.item_count(), 2);
        assert_eq!(seen.total(), Decimal::new(360, 0));

        store.remove_item(&a.id);
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn test_free_shipping_remaining() {
        let cart = Cart::default().apply(CartCommand::Add {
            product: bird("a", 18000),
            quantity: 1,
        });
        let threshold = Decimal::new(500, 0);
        assert_eq!(cart.free_shipping_remaining(threshold), Decimal::new(320, 0));

        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("a"),
            quantity: 3,
        });
        assert_eq!(cart.free_shipping_remaining(threshold), Decimal::ZERO);
    }

    #[test]
    fn test_installment_options() {
        let cart = Cart::default().apply(CartCommand::Add {
            product: bird("a", 18000),
            quantity: 1,
        });
        let options = cart.installment_options(12);
        assert_eq!(options.len(), 12);
        assert_eq!(options.first().unwrap().amount, Decimal::new(180, 0));
        assert_eq!(options.last().unwrap().amount, Decimal::new(1500, 2));
        // 180 / 7 = 25.714...
        assert_eq!(options.get(6).unwrap().amount, Decimal::new(2571, 2));
    }
}
