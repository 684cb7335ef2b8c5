//! Checkout route handlers.
//!
//! The checkout form posts the chosen address and the total the shopper was
//! shown. Refusals re-render the form (with the fresh total) and a toast;
//! success redirects to the confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{AddressId, OrderId, UserId};

use crate::db::{AddressRepository, CartRepository, OrderRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::address::Address;
use crate::models::cart::CartView;
use crate::models::order::Order;
use crate::routes::actions::{ActionResult, CART_UPDATED, is_htmx};
use crate::routes::layout::Layout;
use crate::services::checkout::{self, CheckoutError};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub address_id: Option<AddressId>,
    /// Cart subtotal as rendered on the page, e.g. `"59.90"`.
    #[serde(default)]
    pub total: String,
}

/// An address radio option on the checkout form.
#[derive(Debug, Clone)]
pub struct AddressChoice {
    pub address: Address,
    pub checked: bool,
}

/// Address options with the preselected one checked.
fn address_choices(addresses: Vec<Address>, submitted: Option<AddressId>) -> Vec<AddressChoice> {
    let selected = preselect(&addresses, submitted);
    addresses
        .into_iter()
        .map(|address| AddressChoice {
            checked: Some(address.id) == selected,
            address,
        })
        .collect()
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub addresses: Vec<AddressChoice>,
    pub error: Option<String>,
}

/// Checkout form fragment, re-rendered after a refused checkout.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_form.html")]
pub struct CheckoutFormTemplate {
    pub cart: CartView,
    pub addresses: Vec<AddressChoice>,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {
    pub layout: Layout,
    pub order: Order,
}

/// The address to preselect: the submitted one if it is still the user's,
/// else the default (listed first).
fn preselect(addresses: &[Address], submitted: Option<AddressId>) -> Option<AddressId> {
    submitted
        .filter(|id| addresses.iter().any(|a| a.id == *id))
        .or_else(|| addresses.first().map(|a| a.id))
}

/// Current cart and addresses for rendering the form.
async fn load_form(state: &AppState, user_id: UserId) -> Result<(CartView, Vec<Address>)> {
    let cart = CartRepository::new(state.pool()).cart(user_id).await?;
    let addresses = AddressRepository::new(state.pool()).list(user_id).await?;
    Ok((cart, addresses))
}

/// Display the checkout page: cart summary and address choice.
#[instrument(skip(state, user, nonce), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let (cart, addresses) = load_form(&state, user.id).await?;

    Ok(CheckoutTemplate {
        layout: Layout::load(&state, Some(user), nonce).await,
        cart,
        addresses: address_choices(addresses, None),
        error: None,
    })
}

/// Place the order (checkout action).
#[instrument(skip(state, user, nonce, headers), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    headers: HeaderMap,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);

    match checkout::place_order(state.pool(), user.id, form.address_id, &form.total).await {
        Ok(order_id) => {
            let order = order_id.to_string();
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.as_str())]));

            let location = format!("/checkout/complete/{order_id}");
            if htmx {
                Ok(AppendHeaders([("HX-Redirect", location)]).into_response())
            } else {
                Ok(Redirect::to(&location).into_response())
            }
        }
        Err(CheckoutError::Repository(e)) => Err(AppError::Database(e)),
        Err(refusal) => {
            tracing::info!(reason = %refusal, "Checkout refused");
            let message = refusal.to_string();
            let (cart, addresses) = load_form(&state, user.id).await?;
            let addresses = address_choices(addresses, form.address_id);

            if htmx {
                let result = ActionResult::error(message.clone());
                Ok((
                    result.headers(&[CART_UPDATED]),
                    CheckoutFormTemplate {
                        cart,
                        addresses,
                        error: Some(message),
                    },
                )
                    .into_response())
            } else {
                Ok(CheckoutTemplate {
                    layout: Layout::load(&state, Some(user), nonce).await,
                    cart,
                    addresses,
                    error: Some(message),
                }
                .into_response())
            }
        }
    }
}

/// Display the order confirmation.
#[instrument(skip(state, user, nonce), fields(user_id = %user.id))]
pub async fn complete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(CheckoutCompleteTemplate {
        layout: Layout::load(&state, Some(user), nonce).await,
        order,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn address(id: i32, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            user_id: UserId::new(1),
            full_name: "Grace Hopper".to_owned(),
            line1: "1 Harbor Rd".to_owned(),
            line2: None,
            city: "Arlington".to_owned(),
            region: "VA".to_owned(),
            postal_code: "22201".to_owned(),
            country_code: "US".to_owned(),
            phone: None,
            is_default,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_preselect_prefers_submitted_owned_address() {
        let addresses = vec![address(1, true), address(2, false)];
        assert_eq!(
            preselect(&addresses, Some(AddressId::new(2))),
            Some(AddressId::new(2))
        );
    }

    #[test]
    fn test_preselect_falls_back_to_default() {
        let addresses = vec![address(1, true), address(2, false)];
        assert_eq!(
            preselect(&addresses, Some(AddressId::new(99))),
            Some(AddressId::new(1))
        );
        assert_eq!(preselect(&[], None), None);
    }

    #[test]
    fn test_address_choices_check_exactly_one() {
        let choices = address_choices(vec![address(1, true), address(2, false)], None);
        let checked: Vec<AddressId> = choices
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.address.id)
            .collect();
        assert_eq!(checked, vec![AddressId::new(1)]);
    }
}
