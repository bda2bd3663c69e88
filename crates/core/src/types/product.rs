//! Catalog product records.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Product category.
///
/// Serialized with the storefront's category ids (`"canários"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "canários")]
    Canarios,
    #[serde(rename = "papagaios")]
    Papagaios,
    #[serde(rename = "calopsitas")]
    Calopsitas,
    #[serde(rename = "periquitos")]
    Periquitos,
    #[serde(rename = "pássaros-exóticos")]
    PassarosExoticos,
    #[serde(rename = "acessórios")]
    Acessorios,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Canarios,
        Self::Papagaios,
        Self::Calopsitas,
        Self::Periquitos,
        Self::PassarosExoticos,
        Self::Acessorios,
    ];

    /// Stable identifier, as used in filters and data files.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Canarios => "canários",
            Self::Papagaios => "papagaios",
            Self::Calopsitas => "calopsitas",
            Self::Periquitos => "periquitos",
            Self::PassarosExoticos => "pássaros-exóticos",
            Self::Acessorios => "acessórios",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Canarios => "Canários",
            Self::Papagaios => "Papagaios",
            Self::Calopsitas => "Calopsitas",
            Self::Periquitos => "Periquitos",
            Self::PassarosExoticos => "Pássaros Exóticos",
            Self::Acessorios => "Acessórios",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Canarios => "🐤",
            Self::Papagaios | Self::Calopsitas | Self::Periquitos => "🦜",
            Self::PassarosExoticos => "🦅",
            Self::Acessorios => "🏠",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when a string is not a known category id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

/// Sex of the bird, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "macho")]
    Macho,
    #[serde(rename = "fêmea")]
    Femea,
    #[serde(rename = "não-definido")]
    NaoDefinido,
}

/// A catalog entry. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Scientific name.
    pub species: String,
    pub description: String,
    pub price: Price,
    /// Price before discount, shown struck through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Category,
    /// Free-form age label, e.g. "4-6 meses".
    pub age: String,
    pub sex: Sex,
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub characteristics: Vec<String>,
    #[serde(default)]
    pub care: Vec<String>,
}

impl Product {
    /// Whole-number discount percentage against `original_price`.
    ///
    /// `None` unless the original price is strictly above the current price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?.amount();
        let price = self.price.amount();
        if original <= price {
            return None;
        }
        let percent = ((original - price) / original * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        percent.to_u32()
    }
}
