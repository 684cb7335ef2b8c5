//! Order repository: placing orders from a cart and reading order history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use threadline_core::{OrderId, OrderStatus, Price, Quantity, UserId};

use super::RepositoryError;
use crate::models::address::Address;
use crate::models::cart::CartView;
use crate::models::order::{Order, OrderItem, OrderSummary};

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    status: OrderStatus,
    total: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    status: OrderStatus,
    total: Decimal,
    ship_to: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_name: String,
    color_name: String,
    size_name: String,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(r: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::from_i32(r.quantity)
            .map_err(|e| RepositoryError::DataCorruption(format!("order item quantity: {e}")))?;

        Ok(Self {
            product_name: r.product_name,
            color_name: r.color_name,
            size_name: r.size_name,
            unit_price: Price::usd(r.unit_price),
            quantity,
        })
    }
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order in one transaction.
    ///
    /// Stock is decremented per line only where the product is still active
    /// and `stock >= quantity`; any failure rolls the whole checkout back.
    /// SKU rows are locked in id order, so concurrent checkouts over the
    /// same SKUs cannot deadlock. The checked-out lines are then deleted,
    /// and if the cart changed since `cart` was read the checkout is rolled
    /// back as well.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a product was deactivated.
    /// Returns `RepositoryError::InsufficientStock` if any SKU ran out.
    /// Returns `RepositoryError::Conflict` if the cart changed concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, address, cart), fields(lines = cart.lines.len()))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        address: &Address,
        cart: &CartView,
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut by_sku: Vec<_> = cart.lines.iter().collect();
        by_sku.sort_by_key(|l| l.variant_size_id);

        for line in by_sku {
            let result = sqlx::query(
                r"
                UPDATE storefront.product_variant_size pvs
                SET stock = pvs.stock - $2
                FROM storefront.product_variant pv, storefront.product p
                WHERE pvs.id = $1
                  AND pv.id = pvs.product_variant_id
                  AND p.id = pv.product_id
                  AND p.active
                  AND pvs.stock >= $2
                ",
            )
            .bind(line.variant_size_id)
            .bind(line.quantity.as_i32())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let active = sqlx::query_scalar::<_, bool>(
                    r"
                    SELECT p.active
                    FROM storefront.product_variant_size pvs
                    JOIN storefront.product_variant pv ON pv.id = pvs.product_variant_id
                    JOIN storefront.product p ON p.id = pv.product_id
                    WHERE pvs.id = $1
                    ",
                )
                .bind(line.variant_size_id)
                .fetch_optional(&mut *tx)
                .await?;

                return Err(if active == Some(true) {
                    RepositoryError::InsufficientStock
                } else {
                    RepositoryError::NotFound
                });
            }
        }

        let order_id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO storefront.order (user_id, address_id, ship_to, status, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(address.id)
        .bind(address.one_line())
        .bind(OrderStatus::Placed)
        .bind(cart.subtotal().rounded())
        .fetch_one(&mut *tx)
        .await?;

        for line in &cart.lines {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (
                    order_id, product_variant_size_id, product_name, color_name,
                    size_name, unit_price, quantity
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(order_id)
            .bind(line.variant_size_id)
            .bind(&line.product_name)
            .bind(&line.color_name)
            .bind(&line.size_name)
            .bind(line.unit_price.amount)
            .bind(line.quantity.as_i32())
            .execute(&mut *tx)
            .await?;
        }

        let line_ids: Vec<i32> = cart.lines.iter().map(|l| l.id.as_i32()).collect();
        let quantities: Vec<i32> = cart.lines.iter().map(|l| l.quantity.as_i32()).collect();

        let deleted = sqlx::query(
            r"
            DELETE FROM storefront.cart_product cp
            USING storefront.cart c
            WHERE c.id = cp.cart_id
              AND c.user_id = $1
              AND (cp.id, cp.quantity) IN (
                  SELECT * FROM UNNEST($2::INT[], $3::INT[])
              )
            ",
        )
        .bind(user_id)
        .bind(&line_ids)
        .bind(&quantities)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted != line_ids.len() as u64 {
            return Err(RepositoryError::Conflict("cart changed during checkout".to_owned()));
        }

        tx.commit().await?;

        Ok(order_id)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.status, o.total,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS item_count,
                   o.created_at
            FROM storefront.order o
            LEFT JOIN storefront.order_item oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OrderSummary {
                id: r.id,
                status: r.status,
                total: Price::usd(r.total),
                item_count: r.item_count,
                created_at: r.created_at,
            })
            .collect())
    }

    /// One of the user's orders with its items.
    ///
    /// Returns `None` for orders that don't exist or belong to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(order) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, status, total, ship_to, created_at
            FROM storefront.order
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT product_name, color_name, size_name, unit_price, quantity
            FROM storefront.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order {
            id: order.id,
            status: order.status,
            total: Price::usd(order.total),
            ship_to: order.ship_to,
            created_at: order.created_at,
            items,
        }))
    }
}
