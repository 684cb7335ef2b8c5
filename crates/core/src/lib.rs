//! Threadline Core - Shared domain types.
//!
//! This crate provides the value types used across the Threadline components:
//! - `storefront` - Public-facing clothing store (catalog, wishlist, cart, checkout)
//! - `cli` - Command-line tools for migrations and demo data
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! With the `postgres` feature enabled the types also implement the sqlx
//! encode/decode traits so repositories can bind them directly.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, quantities, and catalog enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
