//! Catalog view models: categories, listing cards, and grouped product detail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use threadline_core::{
    CategoryId, ColorId, Gender, Price, ProductId, SizeId, VariantId, VariantSizeId,
};

/// A category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<CategoryId>,
}

/// A category with its children, for navigation.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Listing filters parsed from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub gender: Option<Gender>,
    /// Category slug; matches the category and all of its descendants.
    pub category_slug: Option<String>,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
}

impl ProductFilter {
    /// Row offset for this page at the given page size.
    #[must_use]
    pub fn offset(&self, page_size: u32) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(page_size)
    }

    /// Query string reproducing every filter except the page.
    ///
    /// Used by pagination links, which append `page=N`.
    #[must_use]
    pub fn query_without_page(&self) -> String {
        let mut parts = Vec::new();
        if let Some(gender) = self.gender {
            parts.push(format!("gender={gender}"));
        }
        if let Some(slug) = &self.category_slug {
            parts.push(format!("category={}", urlencoding::encode(slug)));
        }
        if let Some(q) = &self.search {
            parts.push(format!("q={}", urlencoding::encode(q)));
        }
        parts.join("&")
    }
}

/// One (product, color) tile on a listing page.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub name: String,
    pub price: Price,
    pub gender: Gender,
    pub category_slug: String,
    pub color_name: String,
    pub color_hex: String,
    pub image_url: String,
    /// Units in stock across all sizes of this variant.
    pub total_stock: i64,
    /// Whether the current viewer has this variant on their wishlist.
    pub in_wishlist: bool,
    pub created_at: DateTime<Utc>,
}

/// A page of listing results.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub cards: Vec<ProductCard>,
    pub page: u32,
    pub has_next: bool,
}

impl ProductListing {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// One flattened row of the product detail join (one per size).
///
/// Variant, color, and size columns come from outer joins and may be
/// missing; [`crate::services::catalog::assemble_detail`] discards rows that
/// lack anything a size option needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DetailRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub gender: Gender,
    pub active: bool,
    pub category_name: String,
    pub category_slug: String,
    pub variant_id: Option<VariantId>,
    pub image_url: Option<String>,
    pub color_id: Option<ColorId>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub variant_size_id: Option<VariantSizeId>,
    pub size_id: Option<SizeId>,
    pub size_name: Option<String>,
    pub size_sort_order: Option<i32>,
    pub stock: Option<i32>,
    pub in_wishlist: bool,
}

/// A product with its colors and their sizes.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub gender: Gender,
    pub category_name: String,
    pub category_slug: String,
    /// Colors ordered by name.
    pub colors: Vec<ColorOption>,
}

impl ProductDetail {
    /// The color to preselect: the requested variant if present, else the
    /// first color with stock.
    #[must_use]
    pub fn selected_color(&self, requested: Option<VariantId>) -> Option<&ColorOption> {
        requested
            .and_then(|id| self.colors.iter().find(|c| c.variant_id == id))
            .or_else(|| self.colors.iter().find(|c| c.in_stock()))
    }
}

/// One color variant of a product.
#[derive(Debug, Clone, Serialize)]
pub struct ColorOption {
    pub variant_id: VariantId,
    pub color_id: ColorId,
    pub name: String,
    pub hex_code: String,
    pub image_url: String,
    pub in_wishlist: bool,
    /// Sizes ordered by the size's sort order.
    pub sizes: Vec<SizeOption>,
}

impl ColorOption {
    /// Whether any size of this color can be added to a cart.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.sizes.iter().any(SizeOption::available)
    }
}

/// One size of a color variant (a SKU).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeOption {
    pub variant_size_id: VariantSizeId,
    pub size_id: SizeId,
    pub name: String,
    pub sort_order: i32,
    pub stock: i32,
}

impl SizeOption {
    #[must_use]
    pub const fn available(&self) -> bool {
        self.stock > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_offset() {
        let filter = ProductFilter {
            page: 3,
            ..ProductFilter::default()
        };
        assert_eq!(filter.offset(24), 48);
        assert_eq!(ProductFilter::default().offset(24), 0);
    }

    #[test]
    fn test_filter_query_without_page_encodes() {
        let filter = ProductFilter {
            gender: Some(Gender::Women),
            category_slug: Some("tops".to_owned()),
            search: Some("linen shirt".to_owned()),
            page: 2,
        };
        assert_eq!(
            filter.query_without_page(),
            "gender=women&category=tops&q=linen%20shirt"
        );
    }
}
