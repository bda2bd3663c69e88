//! Three-step checkout with a simulated submission.
//!
//! The flow walks Customer → Address → Payment, validating the current step
//! before advancing. Submitting waits a configured delay and then yields a
//! confirmed [`Order`]; no payment is actually processed and nothing is
//! stored. `submit` takes `&mut self`, so only one submission per flow can
//! be in flight.

use std::fmt;
use std::time::Duration;

use aviario_core::{Cpf, Email, OrderId, OrderStatus, Price, ProductId};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::{Cart, Installment, installment_amount};

/// Errors raised while filling in or submitting the checkout form.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("expected step {expected}, flow is at {actual}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
    #[error("payment is the last step")]
    NoNextStep,
    #[error("cart is empty")]
    EmptyCart,
    #[error("order was already submitted")]
    AlreadySubmitted,
}

impl CheckoutError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

type Result<T> = std::result::Result<T, CheckoutError>;

/// A page of the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Customer,
    Address,
    Payment,
}

impl CheckoutStep {
    /// 1-based position shown in the progress indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Customer => 1,
            Self::Address => 2,
            Self::Payment => 3,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Dados Pessoais",
            Self::Address => "Endereço",
            Self::Payment => "Pagamento",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Customer => Some(Self::Address),
            Self::Address => Some(Self::Payment),
            Self::Payment => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Customer => None,
            Self::Address => Some(Self::Customer),
            Self::Payment => Some(Self::Address),
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

// =============================================================================
// Form input
// =============================================================================

/// Raw customer fields as typed by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustomerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cpf: String,
}

/// Raw shipping address fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressForm {
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Raw card fields. Card number and CVV never appear in `Debug` output.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    pub card_number: SecretString,
    pub card_name: String,
    /// `MM/AA`
    pub expiry: String,
    pub cvv: SecretString,
    pub installments: u32,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self {
            card_number: SecretString::from(String::new()),
            card_name: String::new(),
            expiry: String::new(),
            cvv: SecretString::from(String::new()),
            installments: 1,
        }
    }
}

// =============================================================================
// Validated data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Email,
    /// Digits only, area code included.
    pub phone: String,
    pub cpf: Cpf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub street: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter state code, uppercase.
    pub state: String,
    /// CEP, 8 digits.
    pub zip_code: String,
}

/// What the order records about the payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub card_last_four: String,
    pub installments: Installment,
}

/// One purchased line, copied from the cart at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

/// A confirmed (simulated) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: CustomerDetails,
    pub shipping_address: ShippingAddress,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
    pub payment: PaymentSummary,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Flow
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submission {
    Editing,
    Submitting,
    Complete(OrderId),
}

/// State of one checkout: current step, form contents and submission status.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    submission: Submission,
    max_installments: u32,
    pub customer: CustomerForm,
    pub address: AddressForm,
    pub payment: PaymentForm,
}

impl CheckoutFlow {
    /// Start an empty flow at the customer step.
    #[must_use]
    pub fn new(max_installments: u32) -> Self {
        Self {
            step: CheckoutStep::Customer,
            submission: Submission::Editing,
            max_installments: max_installments.max(1),
            customer: CustomerForm::default(),
            address: AddressForm::default(),
            payment: PaymentForm::default(),
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// True while the simulated submission is pending.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submission == Submission::Submitting
    }

    /// The id of the placed order, once submission has completed.
    #[must_use]
    pub const fn completed_order(&self) -> Option<OrderId> {
        match self.submission {
            Submission::Complete(id) => Some(id),
            _ => None,
        }
    }

    /// Validate the current step and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns the first validation error of the current step, or
    /// [`CheckoutError::NoNextStep`] at the payment step.
    pub fn next(&mut self) -> Result<CheckoutStep> {
        self.ensure_editable()?;
        match self.step {
            CheckoutStep::Customer => {
                validate_customer(&self.customer)?;
            }
            CheckoutStep::Address => {
                validate_address(&self.address)?;
            }
            CheckoutStep::Payment => {
                validate_payment(&self.payment, self.max_installments, Utc::now())?;
            }
        }
        self.step = self.step.next().ok_or(CheckoutError::NoNextStep)?;
        Ok(self.step)
    }

    /// Go back one step. Returns `false` at the first step, where the caller
    /// should close the checkout instead, and once the order is submitted.
    pub fn back(&mut self) -> bool {
        if self.submission != Submission::Editing {
            return false;
        }
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                true
            }
            None => false,
        }
    }

    /// Return to the first step in editing state, keeping the form contents.
    pub fn reset(&mut self) {
        self.step = CheckoutStep::Customer;
        self.submission = Submission::Editing;
    }

    /// Submit the order for `cart` after a simulated processing `delay`.
    ///
    /// The flow stays in the submitting state while the delay runs; if the
    /// future is dropped early it remains there until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Fails if the flow is not at the payment step, was already submitted,
    /// the cart is empty, or any step has invalid fields.
    #[instrument(skip(self, cart), fields(items = cart.item_count(), total = %cart.total()))]
    pub async fn submit(&mut self, cart: &Cart, delay: Duration) -> Result<Order> {
        self.ensure_editable()?;
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Payment,
                actual: self.step,
            });
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let now = Utc::now();
        let customer = validate_customer(&self.customer)?;
        let shipping_address = validate_address(&self.address)?;
        let card_last_four = validate_payment(&self.payment, self.max_installments, now)?;

        self.submission = Submission::Submitting;
        info!(delay_ms = delay.as_millis(), "Processing order");
        tokio::time::sleep(delay).await;

        let count = self.payment.installments;
        let order = Order {
            id: OrderId::generate(),
            customer,
            shipping_address,
            lines: cart
                .lines()
                .iter()
                .map(|line| OrderLine {
                    product_id: line.product().id.clone(),
                    name: line.product().name.clone(),
                    unit_price: line.product().price,
                    quantity: line.quantity(),
                })
                .collect(),
            total: cart.total(),
            payment: PaymentSummary {
                card_last_four,
                installments: Installment {
                    count,
                    amount: installment_amount(cart.total(), count),
                },
            },
            status: OrderStatus::Confirmed,
            created_at: Utc::now(),
        };

        self.submission = Submission::Complete(order.id);
        info!(order_id = %order.id, "Order confirmed");
        Ok(order)
    }

    fn ensure_editable(&self) -> Result<()> {
        match self.submission {
            Submission::Editing => Ok(()),
            Submission::Submitting | Submission::Complete(_) => {
                warn!("Rejected change to a submitted checkout");
                Err(CheckoutError::AlreadySubmitted)
            }
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CheckoutError::invalid(field, "is required"));
    }
    Ok(value.to_owned())
}

/// Strip the given separators and require the rest to be ASCII digits.
fn digits_only(field: &'static str, value: &str, separators: &[char]) -> Result<String> {
    let mut digits = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !separators.contains(&c) {
            return Err(CheckoutError::invalid(field, format!("unexpected character '{c}'")));
        }
    }
    Ok(digits)
}

fn validate_customer(form: &CustomerForm) -> Result<CustomerDetails> {
    let name = required("name", &form.name)?;
    let email = Email::parse(&form.email).map_err(|e| CheckoutError::invalid("email", e.to_string()))?;

    let phone = digits_only("phone", &form.phone, &[' ', '(', ')', '-', '+'])?;
    if !(10..=13).contains(&phone.len()) {
        return Err(CheckoutError::invalid(
            "phone",
            "must have area code and number (10 to 13 digits)",
        ));
    }

    let cpf = Cpf::parse(&form.cpf).map_err(|e| CheckoutError::invalid("cpf", e.to_string()))?;

    Ok(CustomerDetails {
        name,
        email,
        phone,
        cpf,
    })
}

fn validate_address(form: &AddressForm) -> Result<ShippingAddress> {
    let street = required("street", &form.street)?;
    let number = required("number", &form.number)?;
    let neighborhood = required("neighborhood", &form.neighborhood)?;
    let city = required("city", &form.city)?;

    let state = required("state", &form.state)?.to_ascii_uppercase();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CheckoutError::invalid("state", "must be a two-letter code"));
    }

    let zip_code = digits_only("zip_code", &form.zip_code, &['-', '.'])?;
    if zip_code.len() != 8 {
        return Err(CheckoutError::invalid("zip_code", "CEP must have 8 digits"));
    }

    let complement = Some(form.complement.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_owned);

    Ok(ShippingAddress {
        street,
        number,
        complement,
        neighborhood,
        city,
        state,
        zip_code,
    })
}

/// Returns the last four card digits on success.
fn validate_payment(form: &PaymentForm, max_installments: u32, now: DateTime<Utc>) -> Result<String> {
    let number = digits_only("card_number", form.card_number.expose_secret(), &[' ', '-'])?;
    if !(13..=19).contains(&number.len()) {
        return Err(CheckoutError::invalid("card_number", "must have 13 to 19 digits"));
    }
    if !luhn_valid(&number) {
        return Err(CheckoutError::invalid("card_number", "checksum does not match"));
    }

    required("card_name", &form.card_name)?;
    validate_expiry(&form.expiry, now)?;

    let cvv = digits_only("cvv", form.cvv.expose_secret(), &[])?;
    if !(3..=4).contains(&cvv.len()) {
        return Err(CheckoutError::invalid("cvv", "must have 3 or 4 digits"));
    }

    if !(1..=max_installments).contains(&form.installments) {
        return Err(CheckoutError::invalid(
            "installments",
            format!("must be between 1 and {max_installments}"),
        ));
    }

    Ok(number
        .get(number.len() - 4..)
        .unwrap_or_default()
        .to_owned())
}

/// `MM/AA`, not earlier than the current month.
fn validate_expiry(expiry: &str, now: DateTime<Utc>) -> Result<()> {
    let invalid = || CheckoutError::invalid("expiry", "must be MM/AA");
    let (month, year) = expiry.trim().split_once('/').ok_or_else(invalid)?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(invalid());
    }
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(CheckoutError::invalid("expiry", "month must be 01 to 12"));
    }
    if (2000 + year, month) < (now.year(), now.month()) {
        return Err(CheckoutError::invalid("expiry", "card has expired"));
    }
    Ok(())
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
