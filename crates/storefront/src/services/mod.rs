//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login
//! - `catalog` - Category tree, search patterns, product detail assembly
//! - `checkout` - Checkout validation and order placement

pub mod auth;
pub mod catalog;
pub mod checkout;
