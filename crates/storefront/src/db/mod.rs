//! Database operations for the storefront `PostgreSQL` schema.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `user`, `user_password` - Site authentication
//! - `category`, `color`, `size` - Catalog dimensions
//! - `product`, `product_variant`, `product_variant_size` - Catalog and SKU stock
//! - `wishlist` - (user, variant) membership
//! - `cart`, `cart_product` - One cart per user, one line per SKU
//! - `address` - Shipping addresses
//! - `order`, `order_item` - Placed orders with snapshotted items
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p tl-cli -- migrate
//! ```

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Requested quantity exceeds the stock of a SKU.
    #[error("insufficient stock")]
    InsufficientStock,
}

impl RepositoryError {
    /// Map foreign-key violations to `NotFound`, everything else to `Database`.
    ///
    /// Used by inserts that reference a catalog row the caller picked from a
    /// form, where a dangling reference means the row no longer exists.
    pub(crate) fn from_fk_violation(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::NotFound;
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
