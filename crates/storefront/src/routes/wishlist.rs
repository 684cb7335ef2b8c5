//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::VariantId;

use crate::db::{RepositoryError, WishlistRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::wishlist::WishlistItem;
use crate::routes::actions::{ActionResult, WISHLIST_UPDATED};
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Wishlist action form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub variant_id: VariantId,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub items: Vec<WishlistItem>,
}

/// Heart button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub variant_id: VariantId,
    pub in_wishlist: bool,
}

/// Display the wishlist, newest first.
#[instrument(skip(state, user, nonce), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let items = WishlistRepository::new(state.pool()).list(user.id).await?;

    Ok(WishlistTemplate {
        layout: Layout::load(&state, Some(user), nonce).await,
        items,
    })
}

/// Toggle a variant on the wishlist (HTMX).
///
/// Responds with the heart button in its new state.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let (result, in_wishlist) = match WishlistRepository::new(state.pool())
        .toggle(user.id, form.variant_id)
        .await
    {
        Ok(true) => (ActionResult::success("Saved to your wishlist"), true),
        Ok(false) => (ActionResult::success("Removed from your wishlist"), false),
        Err(RepositoryError::NotFound) => {
            (ActionResult::error("That item is no longer available"), false)
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        result.headers(&[WISHLIST_UPDATED]),
        WishlistButtonTemplate {
            variant_id: form.variant_id,
            in_wishlist,
        },
    )
        .into_response())
}

/// Remove a variant from the wishlist (HTMX).
///
/// Responds with the heart button in its removed state; the wishlist page
/// swaps the whole card out instead. Removing an entry twice is not an error.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let removed = WishlistRepository::new(state.pool())
        .remove(user.id, form.variant_id)
        .await?;

    let result = if removed {
        ActionResult::success("Removed from your wishlist")
    } else {
        ActionResult::silent()
    };
    Ok((
        result.headers(&[WISHLIST_UPDATED]),
        WishlistButtonTemplate {
            variant_id: form.variant_id,
            in_wishlist: false,
        },
    )
        .into_response())
}
