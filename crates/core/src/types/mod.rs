//! Core types for Aviário.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cpf;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use cpf::{Cpf, CpfError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{Category, ParseCategoryError, Product, Sex};
pub use status::OrderStatus;
