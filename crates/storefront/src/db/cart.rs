//! Cart repository.
//!
//! Each user has at most one cart, created on the first add. Lines are
//! unique per (cart, SKU); adding a SKU that is already in the cart grows
//! the existing line. Every quantity change is a single conditional
//! statement, so concurrent requests from the same user cannot lose an
//! update or push a line past the SKU's stock.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use threadline_core::{
    CartId, CartLineId, Price, ProductId, Quantity, UserId, VariantId, VariantSizeId,
};

use super::RepositoryError;
use crate::models::cart::{AddOutcome, CartLine, CartView};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    variant_size_id: VariantSizeId,
    product_id: ProductId,
    variant_id: VariantId,
    product_name: String,
    color_name: String,
    size_name: String,
    image_url: String,
    unit_price: Decimal,
    quantity: i32,
    stock: i32,
    available: bool,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(r: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::from_i32(r.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart line {} quantity: {e}", r.id))
        })?;

        Ok(Self {
            id: r.id,
            variant_size_id: r.variant_size_id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            product_name: r.product_name,
            color_name: r.color_name,
            size_name: r.size_name,
            image_url: r.image_url,
            unit_price: Price::usd(r.unit_price),
            quantity,
            stock: r.stock,
            available: r.available,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    id: CartLineId,
    quantity: i32,
    inserted: bool,
}

/// Repository for the user's cart.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it if this is their first add.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO storefront.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Add `quantity` units of a SKU to the user's cart.
    ///
    /// Inserts a line, or increments the existing line for the same SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the SKU does not exist or its
    /// product is inactive.
    /// Returns `RepositoryError::InsufficientStock` if the line would exceed
    /// the SKU's stock (or the per-line cap).
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        variant_size_id: VariantSizeId,
        quantity: Quantity,
    ) -> Result<AddOutcome, RepositoryError> {
        let purchasable = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM storefront.product_variant_size pvs
                JOIN storefront.product_variant pv ON pv.id = pvs.product_variant_id
                JOIN storefront.product p ON p.id = pv.product_id
                WHERE pvs.id = $1 AND p.active
            )
            ",
        )
        .bind(variant_size_id)
        .fetch_one(self.pool)
        .await?;

        if !purchasable {
            return Err(RepositoryError::NotFound);
        }

        let cart_id = self.get_or_create_cart(user_id).await?;

        // The SELECT produces no row when a fresh line would already exceed
        // stock; the conflict WHERE does the same for an existing line.
        let row = sqlx::query_as::<_, UpsertRow>(
            r"
            INSERT INTO storefront.cart_product (cart_id, product_variant_size_id, quantity)
            SELECT $1, pvs.id, $3
            FROM storefront.product_variant_size pvs
            WHERE pvs.id = $2 AND pvs.stock >= $3
            ON CONFLICT (cart_id, product_variant_size_id) DO UPDATE
            SET quantity = storefront.cart_product.quantity + EXCLUDED.quantity
            WHERE storefront.cart_product.quantity + EXCLUDED.quantity <= LEAST(
                $4,
                (SELECT stock FROM storefront.product_variant_size
                 WHERE id = EXCLUDED.product_variant_size_id)
            )
            RETURNING id, quantity, (xmax = 0) AS inserted
            ",
        )
        .bind(cart_id)
        .bind(variant_size_id)
        .bind(quantity.as_i32())
        .bind(Quantity::LARGEST.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_fk_violation)?
        .ok_or(RepositoryError::InsufficientStock)?;

        let quantity = Quantity::from_i32(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart line {} quantity: {e}", row.id))
        })?;

        Ok(AddOutcome {
            line_id: row.id,
            quantity,
            created: row.inserted,
        })
    }

    /// Increase a line's quantity by one, up to the SKU's stock.
    ///
    /// Returns `false` when the line is not the user's or is already at stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn increment(
        &self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart_product cp
            SET quantity = cp.quantity + 1
            FROM storefront.cart c, storefront.product_variant_size pvs
            WHERE cp.id = $1
              AND c.id = cp.cart_id
              AND c.user_id = $2
              AND pvs.id = cp.product_variant_size_id
              AND cp.quantity < LEAST(pvs.stock, $3)
            ",
        )
        .bind(line_id)
        .bind(user_id)
        .bind(Quantity::LARGEST.as_i32())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decrease a line's quantity by one; never goes below 1.
    ///
    /// Returns `false` when the line is not the user's or is already at 1.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn decrement(
        &self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart_product cp
            SET quantity = cp.quantity - 1
            FROM storefront.cart c
            WHERE cp.id = $1
              AND c.id = cp.cart_id
              AND c.user_id = $2
              AND cp.quantity > 1
            ",
        )
        .bind(line_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a line from the user's cart.
    ///
    /// Returns `true` if a line was deleted; an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_product cp
            USING storefront.cart c
            WHERE cp.id = $1 AND c.id = cp.cart_id AND c.user_id = $2
            ",
        )
        .bind(line_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's cart with every line joined to its SKU, variant, and product.
    ///
    /// A user without a cart gets an empty view; no cart is created. Lines
    /// whose product was deactivated after they were added stay in the
    /// cart, flagged as unavailable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored quantity is out of range.
    #[instrument(skip(self))]
    pub async fn cart(&self, user_id: UserId) -> Result<CartView, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT cp.id,
                   pvs.id AS variant_size_id,
                   p.id AS product_id,
                   pv.id AS variant_id,
                   p.name AS product_name,
                   col.name AS color_name,
                   s.name AS size_name,
                   pv.image_url,
                   p.price AS unit_price,
                   cp.quantity,
                   pvs.stock,
                   p.active AS available
            FROM storefront.cart c
            JOIN storefront.cart_product cp ON cp.cart_id = c.id
            JOIN storefront.product_variant_size pvs ON pvs.id = cp.product_variant_size_id
            JOIN storefront.size s ON s.id = pvs.size_id
            JOIN storefront.product_variant pv ON pv.id = pvs.product_variant_id
            JOIN storefront.color col ON col.id = pv.color_id
            JOIN storefront.product p ON p.id = pv.product_id
            WHERE c.user_id = $1
            ORDER BY cp.created_at, cp.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartView { lines })
    }

    /// Total units in the user's cart, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(cp.quantity), 0)::BIGINT
            FROM storefront.cart c
            JOIN storefront.cart_product cp ON cp.cart_id = c.id
            WHERE c.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        u32::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("cart item count {total}")))
    }
}
