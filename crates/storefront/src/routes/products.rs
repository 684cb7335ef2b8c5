//! Product listing and detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{Gender, ProductId, VariantId};

use crate::db::CatalogRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::catalog::{Category, ColorOption, ProductDetail, ProductFilter, ProductListing};
use crate::routes::layout::Layout;
use crate::services::catalog::{self, normalize_search};
use crate::state::AppState;

/// Raw listing query string.
///
/// Every field is parsed leniently: an unknown gender or a malformed page
/// number is ignored rather than rejected, so hand-edited URLs still show
/// products.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub gender: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

impl ListingQuery {
    /// Parse into a [`ProductFilter`].
    #[must_use]
    pub fn into_filter(self) -> ProductFilter {
        ProductFilter {
            gender: self.gender.as_deref().and_then(|g| g.parse::<Gender>().ok()),
            category_slug: self
                .category
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            search: normalize_search(self.q.as_deref()),
            page: parse_page(self.page.as_deref()),
        }
    }
}

/// Page number from the query string; anything invalid is page 1.
fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}

/// Detail query string: the color to preselect.
#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub variant: Option<VariantId>,
}

/// Product listing template, shared with category pages.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub heading: String,
    pub listing: ProductListing,
    pub filter: ProductFilter,
    pub gender_links: Vec<FilterLink>,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

/// A filter chip; following an active chip clears that filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Link to another page of the same listing.
///
/// `base_path` is `/products` or `/categories/{slug}`; `query` holds every
/// other filter.
fn page_link(base_path: &str, query: &str, page: u32) -> String {
    if query.is_empty() {
        format!("{base_path}?page={page}")
    } else {
        format!("{base_path}?{query}&page={page}")
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetail,
    pub selected: ColorOption,
}

/// Gender chips for a listing, keeping the other filters and resetting the page.
///
/// `filter` must already have the path-carried category removed.
fn gender_links(base_path: &str, filter: &ProductFilter) -> Vec<FilterLink> {
    Gender::ALL
        .iter()
        .map(|&gender| {
            let active = filter.gender == Some(gender);
            let target = ProductFilter {
                gender: (!active).then_some(gender),
                page: 1,
                ..filter.clone()
            };
            let query = target.query_without_page();
            let href = if query.is_empty() {
                base_path.to_owned()
            } else {
                format!("{base_path}?{query}")
            };
            FilterLink {
                label: gender.label(),
                href,
                active,
            }
        })
        .collect()
}

/// Heading for a listing page.
fn listing_heading(filter: &ProductFilter, category: Option<&Category>) -> String {
    let base = category.map_or_else(
        || "All products".to_owned(),
        |c| c.name.clone(),
    );
    let base = match filter.gender {
        Some(gender) => format!("{} / {base}", gender.label()),
        None => base,
    };
    match &filter.search {
        Some(q) => format!("{base}: \u{201c}{q}\u{201d}"),
        None => base,
    }
}

/// Render a listing for a filter, shared by `/products` and `/categories/{slug}`.
pub(crate) async fn render_listing(
    state: &AppState,
    layout: Layout,
    filter: ProductFilter,
    category: Option<&Category>,
    base_path: String,
) -> Result<ProductsIndexTemplate> {
    let viewer = layout.user.as_ref().map(|u| u.id);
    let listing = CatalogRepository::new(state.pool())
        .list_products(&filter, viewer, state.config().page_size)
        .await?;

    // The category route carries the slug in the path, not the query.
    let link_filter = if category.is_some() {
        ProductFilter {
            category_slug: None,
            ..filter.clone()
        }
    } else {
        filter.clone()
    };
    let query = link_filter.query_without_page();

    let prev_link = listing
        .has_prev()
        .then(|| page_link(&base_path, &query, listing.page - 1));
    let next_link = listing
        .has_next
        .then(|| page_link(&base_path, &query, listing.page + 1));

    Ok(ProductsIndexTemplate {
        layout,
        heading: listing_heading(&filter, category),
        listing,
        gender_links: gender_links(&base_path, &link_filter),
        filter,
        prev_link,
        next_link,
    })
}

/// Display the product listing.
#[instrument(skip(state, user, nonce))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.into_filter();

    let category = match filter.category_slug.as_deref() {
        Some(slug) => CatalogRepository::new(state.pool())
            .category_by_slug(slug)
            .await?,
        None => None,
    };

    let layout = Layout::load(&state, user, nonce).await;
    render_listing(&state, layout, filter, category.as_ref(), "/products".to_owned()).await
}

/// Display a product, grouped by color.
#[instrument(skip(state, user, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<ProductId>,
    Query(query): Query<DetailQuery>,
) -> Result<impl IntoResponse> {
    let viewer = user.as_ref().map(|u| u.id);
    let product = catalog::product_detail(state.pool(), id, viewer)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let selected = product
        .selected_color(query.variant)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let product_id = id.to_string();
    add_breadcrumb(
        "navigation",
        "Viewed product",
        Some(&[("product_id", product_id.as_str())]),
    );

    Ok(ProductShowTemplate {
        layout: Layout::load(&state, user, nonce).await,
        product,
        selected,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use threadline_core::CategoryId;

    use super::*;

    #[test]
    fn test_listing_query_parses_leniently() {
        let filter = ListingQuery {
            gender: Some("Women".to_owned()),
            category: Some("  tops ".to_owned()),
            q: Some("  linen  ".to_owned()),
            page: Some("3".to_owned()),
        }
        .into_filter();

        assert_eq!(filter.gender, Some(Gender::Women));
        assert_eq!(filter.category_slug.as_deref(), Some("tops"));
        assert_eq!(filter.search.as_deref(), Some("linen"));
        assert_eq!(filter.page, 3);
    }

    #[test]
    fn test_listing_query_ignores_garbage() {
        let filter = ListingQuery {
            gender: Some("aliens".to_owned()),
            category: Some("   ".to_owned()),
            q: None,
            page: Some("-2".to_owned()),
        }
        .into_filter();

        assert_eq!(filter, ProductFilter {
            page: 1,
            ..ProductFilter::default()
        });
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some(" 7 ")), 7);
    }

    #[test]
    fn test_page_link_keeps_filters() {
        assert_eq!(page_link("/products", "", 2), "/products?page=2");
        assert_eq!(
            page_link("/categories/tops", "gender=men&q=linen", 3),
            "/categories/tops?gender=men&q=linen&page=3"
        );
    }

    #[test]
    fn test_gender_links_toggle_and_keep_search() {
        let filter = ProductFilter {
            gender: Some(Gender::Women),
            search: Some("linen".to_owned()),
            page: 4,
            ..ProductFilter::default()
        };
        let links = gender_links("/products", &filter);
        assert_eq!(links.len(), Gender::ALL.len());

        let women = links.iter().find(|l| l.label == "Women").unwrap();
        assert!(women.active);
        assert_eq!(women.href, "/products?q=linen");

        let men = links.iter().find(|l| l.label == "Men").unwrap();
        assert!(!men.active);
        assert_eq!(men.href, "/products?gender=men&q=linen");
    }

    #[test]
    fn test_listing_heading() {
        let tops = Category {
            id: CategoryId::new(1),
            name: "Tops".to_owned(),
            slug: "tops".to_owned(),
            parent_id: None,
        };
        let filter = ProductFilter {
            gender: Some(Gender::Men),
            ..ProductFilter::default()
        };
        assert_eq!(listing_heading(&filter, Some(&tops)), "Men / Tops");
        assert_eq!(
            listing_heading(&ProductFilter::default(), None),
            "All products"
        );
    }
}
