//! Scripted session replay.
//!
//! A script is a YAML document with a list of steps, applied in order to a
//! fresh [`Storefront`]. The first failing step aborts the replay.
//!
//! ```yaml
//! steps:
//!   - action: add
//!     product: "1"
//!     quantity: 2
//!   - action: toggle-favorite
//!     product: "3"
//!   - action: favorites-to-cart
//!   - action: update
//!     product: "1"
//!     quantity: 1
//!   - action: checkout
//!     customer: { name: Maria Silva, email: maria@exemplo.com, phone: "11987654321", cpf: "529.982.247-25" }
//!     address: { street: Rua das Aves, number: "10", neighborhood: Centro, city: Campinas, state: SP, zipCode: "13010-000" }
//!     payment: { cardNumber: "4111 1111 1111 1111", cardName: MARIA SILVA, expiry: "12/35", cvv: "123", installments: 3 }
//! ```
//!
//! Product ids are strings; quote numeric ids.

use std::path::Path;

use aviario_core::ProductId;
use aviario_storefront::{
    AddressForm, Cart, CustomerForm, Favorites, Order, PaymentForm, Storefront, StorefrontConfig,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A session script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub steps: Vec<Step>,
}

/// One scripted action.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Add {
        product: ProductId,
        #[serde(default = "one")]
        quantity: u32,
    },
    Remove {
        product: ProductId,
    },
    Update {
        product: ProductId,
        quantity: i64,
    },
    ClearCart,
    Favorite {
        product: ProductId,
    },
    Unfavorite {
        product: ProductId,
    },
    ToggleFavorite {
        product: ProductId,
    },
    ClearFavorites,
    FavoritesToCart,
    Checkout {
        customer: CustomerForm,
        address: AddressForm,
        payment: PaymentInput,
    },
}

const fn one() -> u32 {
    1
}

/// Card fields as written in a script.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    card_number: String,
    card_name: String,
    expiry: String,
    cvv: String,
    #[serde(default = "one")]
    installments: u32,
}

impl From<PaymentInput> for PaymentForm {
    fn from(input: PaymentInput) -> Self {
        Self {
            card_number: SecretString::from(input.card_number),
            card_name: input.card_name,
            expiry: input.expiry,
            cvv: SecretString::from(input.cvv),
            installments: input.installments,
        }
    }
}

/// Final state printed after a replay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    cart: Cart,
    favorites: Favorites,
    free_shipping_remaining: Decimal,
    orders: Vec<Order>,
}

/// Replay the script at `path` and print the resulting session.
///
/// # Errors
///
/// Returns an error if the script cannot be read or parsed, the catalog
/// cannot be loaded, or any step fails.
pub async fn replay(
    config: StorefrontConfig,
    path: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let script: Script = serde_yaml::from_str(&content)?;
    info!(path = %path.display(), steps = script.steps.len(), "Replaying session");

    let mut store = Storefront::from_config(config)?;
    let mut orders = Vec::new();

    for (index, step) in script.steps.into_iter().enumerate() {
        let number = index + 1;
        if let Some(order) = apply(&mut store, step)
            .await
            .map_err(|e| format!("step {number}: {e}"))?
        {
            orders.push(order);
        }
    }

    let summary = Summary {
        cart: store.cart().snapshot(),
        favorites: store.favorites().snapshot(),
        free_shipping_remaining: store.free_shipping_remaining(),
        orders,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

async fn apply(
    store: &mut Storefront,
    step: Step,
) -> Result<Option<Order>, aviario_storefront::StorefrontError> {
    match step {
        Step::Add { product, quantity } => store.add_to_cart(&product, quantity)?,
        Step::Remove { product } => store.remove_from_cart(&product),
        Step::Update { product, quantity } => store.update_quantity(&product, quantity),
        Step::ClearCart => store.clear_cart(),
        Step::Favorite { product } => store.add_favorite(&product)?,
        Step::Unfavorite { product } => store.remove_favorite(&product),
        Step::ToggleFavorite { product } => {
            store.toggle_favorite(&product)?;
        }
        Step::ClearFavorites => store.clear_favorites(),
        Step::FavoritesToCart => {
            store.add_all_favorites_to_cart();
        }
        Step::Checkout {
            customer,
            address,
            payment,
        } => {
            let mut flow = store.checkout();
            flow.customer = customer;
            flow.next()?;
            flow.address = address;
            flow.next()?;
            flow.payment = payment.into();
            let order = store.place_order(&mut flow).await?;
            return Ok(Some(order));
        }
    }
    Ok(None)
}

fn print_summary(summary: &Summary) {
    println!("Carrinho ({} itens)", summary.cart.item_count());
    for line in summary.cart.lines() {
        println!(
            "  {:>3} x {} ({}) = R$ {:.2}",
            line.quantity(),
            line.product().name,
            line.product().price,
            line.subtotal()
        );
    }
    println!("  Total: R$ {:.2}", summary.cart.total());
    if summary.free_shipping_remaining > Decimal::ZERO {
        println!(
            "  Faltam R$ {:.2} para frete grátis",
            summary.free_shipping_remaining
        );
    } else if !summary.cart.is_empty() {
        println!("  Frete grátis!");
    }

    println!("Favoritos ({})", summary.favorites.count());
    for product in summary.favorites.products() {
        println!("  [{}] {}", product.id, product.name);
    }

    for order in &summary.orders {
        println!(
            "Pedido {} {}: R$ {:.2} em {}x de R$ {:.2} (cartão final {})",
            order.id,
            order.status,
            order.total,
            order.payment.installments.count,
            order.payment.installments.amount,
            order.payment.card_last_four
        );
    }
}
