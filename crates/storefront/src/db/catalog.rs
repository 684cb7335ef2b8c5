//! Catalog queries: listing, product detail, categories.
//!
//! Listing returns one row per (product, color variant). A variant is only
//! listed when its product is active and at least one of its sizes has
//! stock; the inner join on `product_variant_size` with `stock >= 1` does
//! both the filtering and the per-variant stock sum.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use threadline_core::{Gender, Price, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::catalog::{Category, DetailRow, ProductCard, ProductFilter, ProductListing};
use crate::services::catalog::like_pattern;

#[derive(sqlx::FromRow)]
struct ProductCardRow {
    product_id: ProductId,
    variant_id: VariantId,
    name: String,
    price: Decimal,
    gender: Gender,
    category_slug: String,
    color_name: String,
    color_hex: String,
    image_url: String,
    total_stock: i64,
    in_wishlist: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductCardRow> for ProductCard {
    fn from(r: ProductCardRow) -> Self {
        Self {
            product_id: r.product_id,
            variant_id: r.variant_id,
            name: r.name,
            price: Price::usd(r.price),
            gender: r.gender,
            category_slug: r.category_slug,
            color_name: r.color_name,
            color_hex: r.color_hex,
            image_url: r.image_url,
            total_stock: r.total_stock,
            in_wishlist: r.in_wishlist,
            created_at: r.created_at,
        }
    }
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List visible (product, color) variants matching `filter`.
    ///
    /// `viewer` drives the `in_wishlist` flag; anonymous viewers see `false`
    /// everywhere. Results are newest product first, then by color name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        viewer: Option<UserId>,
        page_size: u32,
    ) -> Result<ProductListing, RepositoryError> {
        let search = filter.search.as_deref().map(like_pattern);

        // One extra row tells us whether a next page exists. UNION (not
        // UNION ALL) stops the walk at ids already seen, so a parent cycle
        // cannot recurse forever.
        let mut rows = sqlx::query_as::<_, ProductCardRow>(
            r"
            WITH RECURSIVE category_scope AS (
                SELECT id FROM storefront.category WHERE slug = $3
                UNION
                SELECT c.id
                FROM storefront.category c
                JOIN category_scope s ON c.parent_id = s.id
            )
            SELECT p.id AS product_id,
                   pv.id AS variant_id,
                   p.name,
                   p.price,
                   p.gender,
                   cat.slug AS category_slug,
                   col.name AS color_name,
                   col.hex_code AS color_hex,
                   pv.image_url,
                   SUM(pvs.stock)::BIGINT AS total_stock,
                   BOOL_OR(w.user_id IS NOT NULL) AS in_wishlist,
                   p.created_at
            FROM storefront.product p
            JOIN storefront.category cat ON cat.id = p.category_id
            JOIN storefront.product_variant pv ON pv.product_id = p.id
            JOIN storefront.color col ON col.id = pv.color_id
            JOIN storefront.product_variant_size pvs
                ON pvs.product_variant_id = pv.id AND pvs.stock >= 1
            LEFT JOIN storefront.wishlist w
                ON w.product_variant_id = pv.id AND w.user_id = $1::INT
            WHERE p.active
              AND ($2::storefront.gender IS NULL OR p.gender = $2)
              AND ($3::TEXT IS NULL OR p.category_id IN (SELECT id FROM category_scope))
              AND ($4::TEXT IS NULL
                   OR p.name ILIKE $4 ESCAPE '\'
                   OR p.description ILIKE $4 ESCAPE '\')
            GROUP BY p.id, cat.slug, pv.id, col.id
            ORDER BY p.created_at DESC, p.id DESC, col.name
            LIMIT $5 OFFSET $6
            ",
        )
        .bind(viewer)
        .bind(filter.gender)
        .bind(filter.category_slug.as_deref())
        .bind(search)
        .bind(i64::from(page_size) + 1)
        .bind(filter.offset(page_size))
        .fetch_all(self.pool)
        .await?;

        let has_next = rows.len() > page_size as usize;
        rows.truncate(page_size as usize);

        Ok(ProductListing {
            cards: rows.into_iter().map(ProductCard::from).collect(),
            page: filter.page.max(1),
            has_next,
        })
    }

    /// Flattened detail rows for one product, one per (color, size).
    ///
    /// Returns an empty vector when the product does not exist. Inactive
    /// products are returned as-is; visibility is decided during assembly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn product_detail_rows(
        &self,
        product_id: ProductId,
        viewer: Option<UserId>,
    ) -> Result<Vec<DetailRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, DetailRow>(
            r"
            SELECT p.id AS product_id,
                   p.name AS product_name,
                   p.description,
                   p.price,
                   p.gender,
                   p.active,
                   cat.name AS category_name,
                   cat.slug AS category_slug,
                   pv.id AS variant_id,
                   pv.image_url,
                   col.id AS color_id,
                   col.name AS color_name,
                   col.hex_code AS color_hex,
                   pvs.id AS variant_size_id,
                   s.id AS size_id,
                   s.name AS size_name,
                   s.sort_order AS size_sort_order,
                   pvs.stock,
                   (w.user_id IS NOT NULL) AS in_wishlist
            FROM storefront.product p
            JOIN storefront.category cat ON cat.id = p.category_id
            LEFT JOIN storefront.product_variant pv ON pv.product_id = p.id
            LEFT JOIN storefront.color col ON col.id = pv.color_id
            LEFT JOIN storefront.product_variant_size pvs ON pvs.product_variant_id = pv.id
            LEFT JOIN storefront.size s ON s.id = pvs.size_id
            LEFT JOIN storefront.wishlist w
                ON w.product_variant_id = pv.id AND w.user_id = $2::INT
            WHERE p.id = $1
            ORDER BY col.name, s.sort_order, s.name
            ",
        )
        .bind(product_id)
        .bind(viewer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// All categories, flat, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, parent_id
            FROM storefront.category
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, parent_id
            FROM storefront.category
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }
}
