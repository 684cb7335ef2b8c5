//! Placed orders.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{OrderId, OrderStatus, Price, Quantity};

/// An order row for the history list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Price,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// An order with its items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Price,
    pub ship_to: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A snapshotted order line; later catalog edits do not change it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_name: String,
    pub color_name: String,
    pub size_name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}
