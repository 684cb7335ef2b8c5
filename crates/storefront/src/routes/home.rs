//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::catalog::{ProductCard, ProductFilter};
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Number of newest products featured on the home page.
const FEATURED_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
}

/// Display the home page: newest arrivals and category links.
#[instrument(skip(state, user, nonce))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let viewer = user.as_ref().map(|u| u.id);
    let listing = CatalogRepository::new(state.pool())
        .list_products(&ProductFilter::default(), viewer, FEATURED_COUNT)
        .await?;

    Ok(HomeTemplate {
        layout: Layout::load(&state, user, nonce).await,
        products: listing.cards,
    })
}
