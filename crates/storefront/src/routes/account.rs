//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::AddressId;

use crate::db::{AddressRepository, OrderRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::address::{Address, NewAddress};
use crate::models::order::OrderSummary;
use crate::routes::layout::Layout;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Orders shown on the overview page.
const RECENT_ORDER_COUNT: usize = 3;

/// Query parameters for flash messages after a redirect.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// New address form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub line1: String,
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country_code: String,
    pub phone: Option<String>,
}

impl AddressForm {
    fn validate(&self) -> std::result::Result<NewAddress, String> {
        NewAddress::new(
            &self.full_name,
            &self.line1,
            self.line2.as_deref(),
            &self.city,
            &self.region,
            &self.postal_code,
            &self.country_code,
            self.phone.as_deref(),
        )
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: Layout,
    pub email: String,
    pub member_since: DateTime<Utc>,
    /// The most recent orders only.
    pub orders: Vec<OrderSummary>,
    pub default_address: Option<Address>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderSummary>,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub addresses: Vec<Address>,
    pub form: AddressForm,
    pub error: Option<String>,
    pub success: Option<&'static str>,
}

/// Flash message for an address-book error code.
fn address_error_message(code: &str) -> String {
    match code {
        "not_found" => "That address no longer exists".to_owned(),
        _ => "Something went wrong, please try again".to_owned(),
    }
}

/// Flash message for an address-book success code.
fn address_success_message(code: &str) -> Option<&'static str> {
    match code {
        "added" => Some("Address saved"),
        "deleted" => Some("Address deleted"),
        _ => None,
    }
}

/// Display account overview page.
#[instrument(skip(state, current_user, nonce), fields(user_id = %current_user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .get_user(current_user.id)
        .await?;
    let mut orders = OrderRepository::new(state.pool())
        .list(current_user.id)
        .await?;
    orders.truncate(RECENT_ORDER_COUNT);
    let default_address = AddressRepository::new(state.pool())
        .list(current_user.id)
        .await?
        .into_iter()
        .find(|a| a.is_default);

    Ok(AccountIndexTemplate {
        layout: Layout::load(&state, Some(current_user), nonce).await,
        email: user.email.to_string(),
        member_since: user.created_at,
        orders,
        default_address,
    })
}

/// Display order history, newest first.
#[instrument(skip(state, user, nonce), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool()).list(user.id).await?;

    Ok(OrdersTemplate {
        layout: Layout::load(&state, Some(user), nonce).await,
        orders,
    })
}

/// Display the address book with the new-address form.
#[instrument(skip(state, user, nonce), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;

    Ok(AddressesTemplate {
        layout: Layout::load(&state, Some(user), nonce).await,
        addresses,
        form: AddressForm::default(),
        error: query.error.as_deref().map(address_error_message),
        success: query.success.as_deref().and_then(address_success_message),
    })
}

/// Save a new address.
///
/// Invalid input re-renders the page with the submitted values so nothing
/// has to be typed twice.
#[instrument(skip(state, user, nonce, form), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let repo = AddressRepository::new(state.pool());

    let error = match form.validate() {
        Ok(address) => match repo.create(user.id, &address).await {
            Ok(created) => {
                tracing::info!(address_id = %created.id, "Address added");
                return Ok(Redirect::to("/account/addresses?success=added").into_response());
            }
            // Two first addresses raced for the default slot.
            Err(RepositoryError::Conflict(_)) => {
                "Could not save the address, please try again".to_owned()
            }
            Err(e) => return Err(e.into()),
        },
        Err(message) => message,
    };

    let addresses = repo.list(user.id).await?;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        AddressesTemplate {
            layout: Layout::load(&state, Some(user), nonce).await,
            addresses,
            form,
            error: Some(error),
            success: None,
        },
    )
        .into_response())
}

/// Delete an address. The oldest remaining address becomes the default if
/// the default was deleted.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let deleted = AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;

    let target = if deleted {
        "/account/addresses?success=deleted"
    } else {
        "/account/addresses?error=not_found"
    };
    Ok(Redirect::to(target).into_response())
}
