//! Wishlist repository.
//!
//! Membership is a set keyed on (user, variant): adding twice leaves one row
//! and removing an absent entry is not an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use threadline_core::{Price, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::wishlist::WishlistItem;

#[derive(sqlx::FromRow)]
struct WishlistItemRow {
    variant_id: VariantId,
    product_id: ProductId,
    product_name: String,
    price: Decimal,
    color_name: String,
    color_hex: String,
    image_url: String,
    available: bool,
    added_at: DateTime<Utc>,
}

impl From<WishlistItemRow> for WishlistItem {
    fn from(r: WishlistItemRow) -> Self {
        Self {
            variant_id: r.variant_id,
            product_id: r.product_id,
            product_name: r.product_name,
            price: Price::usd(r.price),
            color_name: r.color_name,
            color_hex: r.color_hex,
            image_url: r.image_url,
            available: r.available,
            added_at: r.added_at,
        }
    }
}

/// Repository for wishlist membership.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a variant to the user's wishlist.
    ///
    /// Returns `true` if a row was created, `false` if it was already there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: UserId, variant_id: VariantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.wishlist (user_id, product_variant_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_variant_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(variant_id)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_fk_violation)?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a variant from the user's wishlist.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.wishlist
            WHERE user_id = $1 AND product_variant_id = $2
            ",
        )
        .bind(user_id)
        .bind(variant_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove the variant if present, otherwise add it.
    ///
    /// Returns the membership state after the toggle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn toggle(
        &self,
        user_id: UserId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        if self.remove(user_id, variant_id).await? {
            return Ok(false);
        }
        // A concurrent toggle may have inserted in between; either way the
        // variant ends up on the list.
        self.add(user_id, variant_id).await?;
        Ok(true)
    }

    /// Whether the variant is on the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn contains(
        &self,
        user_id: UserId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM storefront.wishlist
                WHERE user_id = $1 AND product_variant_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(variant_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// The user's wishlist, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistItemRow>(
            r"
            SELECT pv.id AS variant_id,
                   p.id AS product_id,
                   p.name AS product_name,
                   p.price,
                   col.name AS color_name,
                   col.hex_code AS color_hex,
                   pv.image_url,
                   (p.active AND EXISTS (
                       SELECT 1 FROM storefront.product_variant_size pvs
                       WHERE pvs.product_variant_id = pv.id AND pvs.stock >= 1
                   )) AS available,
                   w.created_at AS added_at
            FROM storefront.wishlist w
            JOIN storefront.product_variant pv ON pv.id = w.product_variant_id
            JOIN storefront.product p ON p.id = pv.product_id
            JOIN storefront.color col ON col.id = pv.color_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC, pv.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(WishlistItem::from).collect())
    }
}
