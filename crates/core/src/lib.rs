//! Aviário Core - Shared value types.
//!
//! This crate provides the types used across the Aviário components:
//! - `storefront` - Cart, favorites, catalog queries and checkout
//! - `cli` - Command-line front end for browsing and scripted sessions
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no async,
//! no global state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product records, type-safe IDs, prices, and checkout field types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
