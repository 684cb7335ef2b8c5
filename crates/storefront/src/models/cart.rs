//! Cart view models.

use serde::Serialize;

use threadline_core::{CartLineId, Price, ProductId, Quantity, VariantId, VariantSizeId};

/// One cart line joined to its SKU, variant, and product.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub variant_size_id: VariantSizeId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub color_name: String,
    pub size_name: String,
    pub image_url: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    /// Current stock of the SKU.
    pub stock: i32,
    /// `false` once the product has been deactivated.
    pub available: bool,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// The decrement control is disabled at quantity 1.
    #[must_use]
    pub const fn can_decrement(&self) -> bool {
        self.quantity.get() > Quantity::MIN
    }

    /// The increment control is disabled once the line holds all the stock.
    #[must_use]
    pub const fn can_increment(&self) -> bool {
        self.available
            && self.quantity.as_i32() < self.stock
            && self.quantity.get() < Quantity::MAX
    }
}

/// A user's cart as rendered on the cart and checkout pages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    /// Lines in the order they were added.
    pub lines: Vec<CartLine>,
}

impl CartView {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `true` if any line's product is no longer sold.
    #[must_use]
    pub fn has_unavailable(&self) -> bool {
        self.lines.iter().any(|l| !l.available)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity.get()).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::sum(self.lines.iter().map(CartLine::line_total))
            .unwrap_or_else(|| Price::zero(threadline_core::CurrencyCode::default()))
    }
}

/// Result of an add-to-cart upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub line_id: CartLineId,
    /// Quantity on the line after the add.
    pub quantity: Quantity,
    /// `true` when a new line was inserted, `false` when an existing one grew.
    pub created: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn line(id: i32, price: &str, quantity: u32, stock: i32) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            variant_size_id: VariantSizeId::new(id * 10),
            product_id: ProductId::new(1),
            variant_id: VariantId::new(1),
            product_name: "Linen Shirt".to_owned(),
            color_name: "Sand".to_owned(),
            size_name: "M".to_owned(),
            image_url: "/img/shirt.jpg".to_owned(),
            unit_price: Price::usd(Decimal::from_str(price).unwrap()),
            quantity: Quantity::new(quantity).unwrap(),
            stock,
            available: true,
        }
    }

    #[test]
    fn test_decrement_disabled_at_one() {
        assert!(!line(1, "10.00", 1, 5).can_decrement());
        assert!(line(1, "10.00", 2, 5).can_decrement());
    }

    #[test]
    fn test_increment_disabled_at_stock() {
        assert!(!line(1, "10.00", 5, 5).can_increment());
        assert!(line(1, "10.00", 4, 5).can_increment());
        // Stock dropped below the line quantity after it was added.
        assert!(!line(1, "10.00", 3, 1).can_increment());
    }

    #[test]
    fn test_unavailable_line() {
        let mut retired = line(2, "10.00", 1, 5);
        retired.available = false;
        assert!(!retired.can_increment());

        let cart = CartView {
            lines: vec![line(1, "10.00", 1, 5), retired],
        };
        assert!(cart.has_unavailable());
        let in_stock = CartView {
            lines: vec![line(1, "10.00", 1, 5)],
        };
        assert!(!in_stock.has_unavailable());
    }

    #[test]
    fn test_subtotal_and_count() {
        let cart = CartView {
            lines: vec![line(1, "24.99", 2, 10), line(2, "5.50", 3, 10)],
        };
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal().display(), "$66.48");
    }

    #[test]
    fn test_empty_cart() {
        let cart = CartView::default();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal().display(), "$0.00");
    }
}
