//! Cart route handlers.
//!
//! The cart lives in the database, one per user, created on the first add.
//! Mutations are HTMX form actions: they answer with the re-rendered cart
//! items (or nothing, for add) and an `HX-Trigger` carrying the toast and a
//! `cart-updated` event for the header badge.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{CartLineId, Quantity, UserId, VariantSizeId};

use crate::db::{CartRepository, RepositoryError};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth};
use crate::models::cart::{AddOutcome, CartView};
use crate::routes::actions::{ActionResult, CART_UPDATED};
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_size_id: VariantSizeId,
    pub quantity: Option<u32>,
}

/// Form data for actions on an existing line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub line_id: CartLineId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Toast for a successful add.
fn added_message(outcome: &AddOutcome) -> String {
    if outcome.created {
        "Added to cart".to_owned()
    } else {
        format!("Cart updated: {} in your cart", outcome.quantity)
    }
}

/// Toast for an add that failed for an expected reason.
///
/// Returns `None` for errors that are our fault.
fn add_error_message(error: &RepositoryError) -> Option<&'static str> {
    match error {
        RepositoryError::NotFound => Some("That item is no longer available"),
        RepositoryError::InsufficientStock => Some("Not enough stock for that quantity"),
        _ => None,
    }
}

/// Display cart page.
#[instrument(skip(state, user, nonce), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool()).cart(user.id).await?;

    Ok(CartShowTemplate {
        layout: Layout::load(&state, Some(user), nonce).await,
        cart,
    })
}

/// Add item to cart (HTMX).
///
/// Anonymous shoppers get a toast asking them to sign in rather than a
/// redirect, so the product page stays where it is.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let Some(user) = user else {
        return Ok(ActionResult::error("Please sign in to add items to your cart")
            .headers(&[])
            .into_response());
    };

    let quantity = match Quantity::new(form.quantity.unwrap_or(1)) {
        Ok(quantity) => quantity,
        Err(e) => {
            return Ok(ActionResult::error(format!("Invalid quantity: {e}"))
                .headers(&[])
                .into_response());
        }
    };

    let result = match CartRepository::new(state.pool())
        .add(user.id, form.variant_size_id, quantity)
        .await
    {
        Ok(outcome) => {
            let sku = form.variant_size_id.to_string();
            add_breadcrumb("cart", "Added to cart", Some(&[("variant_size_id", sku.as_str())]));
            ActionResult::success(added_message(&outcome))
        }
        Err(e) => match add_error_message(&e) {
            Some(message) => {
                tracing::info!(error = %e, "Add to cart refused");
                ActionResult::error(message)
            }
            None => return Err(e.into()),
        },
    };

    let events: &[&str] = if result.is_error() { &[] } else { &[CART_UPDATED] };
    Ok(result.headers(events).into_response())
}

/// Re-render the cart items with a toast.
async fn cart_items_response(
    state: &AppState,
    user_id: UserId,
    result: &ActionResult,
) -> Result<Response> {
    let cart = CartRepository::new(state.pool()).cart(user_id).await?;
    Ok((result.headers(&[CART_UPDATED]), CartItemsTemplate { cart }).into_response())
}

/// Increase a line's quantity by one (HTMX).
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn increment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let changed = CartRepository::new(state.pool())
        .increment(user.id, form.line_id)
        .await?;

    let result = if changed {
        ActionResult::silent()
    } else {
        ActionResult::error("No more of this item is available")
    };
    cart_items_response(&state, user.id, &result).await
}

/// Decrease a line's quantity by one, stopping at 1 (HTMX).
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn decrement(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let changed = CartRepository::new(state.pool())
        .decrement(user.id, form.line_id)
        .await?;

    let result = if changed {
        ActionResult::silent()
    } else {
        ActionResult::error("Use remove to take this item out of your cart")
    };
    cart_items_response(&state, user.id, &result).await
}

/// Remove a line from the cart (HTMX).
///
/// Removing a line that is already gone is not an error.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let removed = CartRepository::new(state.pool())
        .remove(user.id, form.line_id)
        .await?;

    let result = if removed {
        ActionResult::success("Removed from cart")
    } else {
        ActionResult::silent()
    };
    cart_items_response(&state, user.id, &result).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let count = match user {
        Some(user) => CartRepository::new(state.pool()).count(user.id).await?,
        None => 0,
    };

    Ok(CartCountTemplate { count })
}
