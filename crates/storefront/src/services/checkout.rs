//! Checkout: validate the submitted form against the server's view of the
//! cart, then place the order.
//!
//! There is no payment step. A checkout succeeds when an address owned by
//! the shopper is selected, the cart is non-empty, every product in it is
//! still sold, the total the shopper saw still equals the cart subtotal,
//! and every line is still in stock.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use threadline_core::{AddressId, OrderId, UserId};

use crate::db::{AddressRepository, CartRepository, OrderRepository, RepositoryError};
use crate::models::address::Address;
use crate::models::cart::CartView;

/// Reasons a checkout is refused.
///
/// Every variant except `Repository` is an expected outcome shown to the
/// shopper as an action result.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No address was submitted.
    #[error("Please choose a shipping address")]
    MissingAddress,

    /// The submitted address does not belong to the shopper.
    #[error("That shipping address is not available")]
    UnknownAddress,

    /// The cart has no lines.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A product in the cart has been deactivated.
    #[error("Some items in your cart are no longer available")]
    UnavailableItems,

    /// The submitted total no longer matches the cart, or the cart changed
    /// while the order was being placed.
    #[error("Your cart has changed, please review the new total")]
    StaleTotal,

    /// A SKU ran out of stock before the order could be placed.
    #[error("Some items in your cart are no longer in stock")]
    OutOfStock,

    /// Unexpected database failure.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CheckoutError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::InsufficientStock => Self::OutOfStock,
            RepositoryError::NotFound => Self::UnavailableItems,
            RepositoryError::Conflict(_) => Self::StaleTotal,
            other => Self::Repository(other),
        }
    }
}

/// Check a checkout submission against the user's addresses and cart.
///
/// `submitted_total` is the total rendered on the checkout page; it must
/// equal the current subtotal to the cent.
///
/// # Errors
///
/// Returns the first failed check as a [`CheckoutError`].
pub fn validate_checkout<'a>(
    address_id: Option<AddressId>,
    addresses: &'a [Address],
    cart: &CartView,
    submitted_total: &str,
) -> Result<&'a Address, CheckoutError> {
    let address_id = address_id.ok_or(CheckoutError::MissingAddress)?;
    let address = addresses
        .iter()
        .find(|a| a.id == address_id)
        .ok_or(CheckoutError::UnknownAddress)?;

    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    if cart.has_unavailable() {
        return Err(CheckoutError::UnavailableItems);
    }

    let submitted = Decimal::from_str(submitted_total.trim())
        .map_err(|_| CheckoutError::StaleTotal)?
        .round_dp(2);
    if submitted != cart.subtotal().rounded() {
        return Err(CheckoutError::StaleTotal);
    }

    Ok(address)
}

/// Validate and place an order for the user's current cart.
///
/// # Errors
///
/// Returns a [`CheckoutError`] describing why the order was not placed.
#[instrument(skip(pool))]
pub async fn place_order(
    pool: &PgPool,
    user_id: UserId,
    address_id: Option<AddressId>,
    submitted_total: &str,
) -> Result<OrderId, CheckoutError> {
    let addresses = AddressRepository::new(pool).list(user_id).await?;
    let cart = CartRepository::new(pool).cart(user_id).await?;

    let address = validate_checkout(address_id, &addresses, &cart, submitted_total)?;

    let order_id = OrderRepository::new(pool)
        .place_order(user_id, address, &cart)
        .await?;

    info!(
        order_id = %order_id,
        items = cart.item_count(),
        total = %cart.subtotal(),
        "Order placed"
    );

    Ok(order_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use threadline_core::{
        CartLineId, Price, ProductId, Quantity, VariantId, VariantSizeId,
    };

    use super::*;
    use crate::models::cart::CartLine;

    fn address(id: i32) -> Address {
        Address {
            id: AddressId::new(id),
            user_id: UserId::new(1),
            full_name: "Ada Lovelace".to_owned(),
            line1: "12 Loom St".to_owned(),
            line2: None,
            city: "London".to_owned(),
            region: "Greater London".to_owned(),
            postal_code: "N1 9GU".to_owned(),
            country_code: "GB".to_owned(),
            phone: None,
            is_default: id == 1,
            created_at: Utc::now(),
        }
    }

    fn cart() -> CartView {
        CartView {
            lines: vec![CartLine {
                id: CartLineId::new(1),
                variant_size_id: VariantSizeId::new(1),
                product_id: ProductId::new(1),
                variant_id: VariantId::new(1),
                product_name: "Linen Shirt".to_owned(),
                color_name: "Sand".to_owned(),
                size_name: "M".to_owned(),
                image_url: "/img/1.jpg".to_owned(),
                unit_price: Price::usd(Decimal::from_str("24.50").unwrap()),
                quantity: Quantity::new(2).unwrap(),
                stock: 5,
                available: true,
            }],
        }
    }

    #[test]
    fn test_valid_checkout_returns_address() {
        let addresses = [address(1), address(2)];
        let chosen =
            validate_checkout(Some(AddressId::new(2)), &addresses, &cart(), "49.00").unwrap();
        assert_eq!(chosen.id, AddressId::new(2));
    }

    #[test]
    fn test_total_formats_are_equivalent() {
        let addresses = [address(1)];
        assert!(validate_checkout(Some(AddressId::new(1)), &addresses, &cart(), "49").is_ok());
        assert!(validate_checkout(Some(AddressId::new(1)), &addresses, &cart(), " 49.0 ").is_ok());
    }

    #[test]
    fn test_missing_address() {
        let addresses = [address(1)];
        let result = validate_checkout(None, &addresses, &cart(), "49.00");
        assert!(matches!(result, Err(CheckoutError::MissingAddress)));
    }

    #[test]
    fn test_foreign_address() {
        let addresses = [address(1)];
        let result = validate_checkout(Some(AddressId::new(7)), &addresses, &cart(), "49.00");
        assert!(matches!(result, Err(CheckoutError::UnknownAddress)));
    }

    #[test]
    fn test_empty_cart() {
        let addresses = [address(1)];
        let result = validate_checkout(
            Some(AddressId::new(1)),
            &addresses,
            &CartView::default(),
            "0.00",
        );
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_deactivated_product_blocks_checkout() {
        let mut cart = cart();
        cart.lines[0].available = false;
        let addresses = [address(1)];
        let result = validate_checkout(Some(AddressId::new(1)), &addresses, &cart, "49.00");
        assert!(matches!(result, Err(CheckoutError::UnavailableItems)));
    }

    #[test]
    fn test_stale_or_garbled_total() {
        let addresses = [address(1)];
        for total in ["48.99", "", "forty-nine"] {
            let result = validate_checkout(Some(AddressId::new(1)), &addresses, &cart(), total);
            assert!(matches!(result, Err(CheckoutError::StaleTotal)), "{total}");
        }
    }

    #[test]
    fn test_repository_errors_map_to_outcomes() {
        assert!(matches!(
            CheckoutError::from(RepositoryError::InsufficientStock),
            CheckoutError::OutOfStock
        ));
        assert!(matches!(
            CheckoutError::from(RepositoryError::Conflict("cart".to_owned())),
            CheckoutError::StaleTotal
        ));
        assert!(matches!(
            CheckoutError::from(RepositoryError::NotFound),
            CheckoutError::UnavailableItems
        ));
        assert!(matches!(
            CheckoutError::from(RepositoryError::DataCorruption("row".to_owned())),
            CheckoutError::Repository(_)
        ));
    }
}
