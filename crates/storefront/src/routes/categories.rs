//! Category route handlers.
//!
//! A category page is the product listing restricted to the category and
//! everything beneath it.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::layout::Layout;
use crate::routes::products::{ListingQuery, render_listing};
use crate::state::AppState;

/// Display products in a category subtree.
#[instrument(skip(state, user, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let category = CatalogRepository::new(state.pool())
        .category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let mut filter = query.into_filter();
    filter.category_slug = Some(category.slug.clone());

    let layout = Layout::load(&state, user, nonce).await;
    let base_path = format!("/categories/{}", urlencoding::encode(&category.slug));
    render_listing(&state, layout, filter, Some(&category), base_path).await
}
