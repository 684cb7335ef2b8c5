//! Wishlist view model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Price, ProductId, VariantId};

/// A wishlisted variant joined to its product and color.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    pub color_name: String,
    pub color_hex: String,
    pub image_url: String,
    /// Product is active and some size of the variant is in stock.
    pub available: bool,
    pub added_at: DateTime<Utc>,
}
