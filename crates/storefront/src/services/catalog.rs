//! Catalog assembly.
//!
//! The detail query returns one flat row per (color, size); this module
//! folds those rows into the nested product -> colors -> sizes shape the
//! product page renders. The category list is folded into a tree the same
//! way and cached for navigation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, instrument};

use threadline_core::{CategoryId, Price, ProductId, UserId};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::catalog::{
    Category, CategoryNode, ColorOption, DetailRow, ProductDetail, SizeOption,
};
use crate::state::AppState;

/// Longest search term accepted; longer input is truncated.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Trim a raw search term; blank terms mean "no search".
#[must_use]
pub fn normalize_search(raw: Option<&str>) -> Option<String> {
    let term = raw?.trim();
    if term.is_empty() {
        return None;
    }
    Some(term.chars().take(MAX_SEARCH_LENGTH).collect())
}

/// Build an `ILIKE` substring pattern that matches `term` literally.
///
/// `%`, `_` and the escape character `\` are escaped so shoppers searching
/// for "100%" don't match everything.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Fold a flat category list into a forest.
///
/// Roots and siblings are sorted by name. A category whose parent is not in
/// the list is treated as a root.
#[must_use]
pub fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let ids: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<CategoryId, Vec<Category>> = HashMap::new();
    let mut roots = Vec::new();

    for category in categories {
        match category.parent_id {
            Some(parent) if parent != category.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(category);
            }
            _ => roots.push(category),
        }
    }

    roots.sort_by(|a, b| a.name.cmp(&b.name));
    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect()
}

// Each category's children are removed from the map as they are attached,
// so a parent cycle can't recurse forever.
fn attach_children(
    category: Category,
    children: &mut HashMap<CategoryId, Vec<Category>>,
) -> CategoryNode {
    let mut direct = children.remove(&category.id).unwrap_or_default();
    direct.sort_by(|a, b| a.name.cmp(&b.name));

    CategoryNode {
        children: direct
            .into_iter()
            .map(|child| attach_children(child, children))
            .collect(),
        category,
    }
}

/// Fold detail rows into a [`ProductDetail`].
///
/// Rows missing a price, stock, or any variant/color/size column are
/// discarded. Colors are ordered by name and sizes by sort order.
/// Returns `None` when there are no rows, the product is inactive, or no
/// size of any color is in stock.
#[must_use]
pub fn assemble_detail(rows: Vec<DetailRow>) -> Option<ProductDetail> {
    let first = rows.first()?;
    if !first.active {
        return None;
    }

    let mut detail = ProductDetail {
        id: first.product_id,
        name: first.product_name.clone(),
        description: first.description.clone(),
        price: Price::usd(first.price?),
        gender: first.gender,
        category_name: first.category_name.clone(),
        category_slug: first.category_slug.clone(),
        colors: Vec::new(),
    };

    for row in rows {
        let (
            Some(variant_id),
            Some(image_url),
            Some(color_id),
            Some(color_name),
            Some(color_hex),
            Some(variant_size_id),
            Some(size_id),
            Some(size_name),
            Some(stock),
            Some(_price),
        ) = (
            row.variant_id,
            row.image_url,
            row.color_id,
            row.color_name,
            row.color_hex,
            row.variant_size_id,
            row.size_id,
            row.size_name,
            row.stock,
            row.price,
        )
        else {
            continue;
        };

        let size = SizeOption {
            variant_size_id,
            size_id,
            name: size_name,
            sort_order: row.size_sort_order.unwrap_or_default(),
            stock,
        };

        match detail.colors.iter_mut().find(|c| c.variant_id == variant_id) {
            Some(color) => {
                color.in_wishlist |= row.in_wishlist;
                color.sizes.push(size);
            }
            None => detail.colors.push(ColorOption {
                variant_id,
                color_id,
                name: color_name,
                hex_code: color_hex,
                image_url,
                in_wishlist: row.in_wishlist,
                sizes: vec![size],
            }),
        }
    }

    detail.colors.sort_by(|a, b| a.name.cmp(&b.name));
    for color in &mut detail.colors {
        color
            .sizes
            .sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
    }

    detail.colors.iter().any(ColorOption::in_stock).then_some(detail)
}

/// Load and assemble a product page.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
#[instrument(skip(pool))]
pub async fn product_detail(
    pool: &PgPool,
    product_id: ProductId,
    viewer: Option<UserId>,
) -> Result<Option<ProductDetail>, RepositoryError> {
    let rows = CatalogRepository::new(pool)
        .product_detail_rows(product_id, viewer)
        .await?;
    Ok(assemble_detail(rows))
}

/// The category tree for navigation, cached for five minutes.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the categories cannot be loaded.
pub async fn category_tree(state: &AppState) -> Result<Arc<Vec<CategoryNode>>, RepositoryError> {
    if let Some(tree) = state.category_cache().get(&()).await {
        return Ok(tree);
    }

    let categories = CatalogRepository::new(state.pool()).categories().await?;
    debug!(count = categories.len(), "Loaded categories");

    let tree = Arc::new(build_category_tree(categories));
    state.category_cache().insert((), Arc::clone(&tree)).await;
    Ok(tree)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use threadline_core::{ColorId, Gender, SizeId, VariantId, VariantSizeId};

    use super::*;

    fn category(id: i32, name: &str, parent: Option<i32>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase(),
            parent_id: parent.map(CategoryId::new),
        }
    }

    fn row(variant: i32, color: &str, sku: i32, size: &str, sort: i32, stock: i32) -> DetailRow {
        DetailRow {
            product_id: ProductId::new(1),
            product_name: "Linen Shirt".to_owned(),
            description: "Breathable".to_owned(),
            price: Some(Decimal::from_str("49.00").unwrap()),
            gender: Gender::Women,
            active: true,
            category_name: "Tops".to_owned(),
            category_slug: "tops".to_owned(),
            variant_id: Some(VariantId::new(variant)),
            image_url: Some(format!("/img/{variant}.jpg")),
            color_id: Some(ColorId::new(variant)),
            color_name: Some(color.to_owned()),
            color_hex: Some("#000000".to_owned()),
            variant_size_id: Some(VariantSizeId::new(sku)),
            size_id: Some(SizeId::new(sort)),
            size_name: Some(size.to_owned()),
            size_sort_order: Some(sort),
            stock: Some(stock),
            in_wishlist: false,
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("shirt"), "%shirt%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(None), None);
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(Some(" denim ")), Some("denim".to_owned()));
        let long = "x".repeat(500);
        assert_eq!(
            normalize_search(Some(&long)).unwrap().len(),
            MAX_SEARCH_LENGTH
        );
    }

    #[test]
    fn test_category_tree_nests_and_sorts() {
        let tree = build_category_tree(vec![
            category(3, "Tees", Some(1)),
            category(1, "Tops", None),
            category(2, "Bottoms", None),
            category(4, "Blouses", Some(1)),
        ]);

        let names: Vec<_> = tree.iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, ["Bottoms", "Tops"]);

        let tops: Vec<_> = tree[1]
            .children
            .iter()
            .map(|n| n.category.name.as_str())
            .collect();
        assert_eq!(tops, ["Blouses", "Tees"]);
    }

    #[test]
    fn test_category_tree_orphans_become_roots() {
        let tree = build_category_tree(vec![category(5, "Socks", Some(99))]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].category.name, "Socks");
    }

    #[test]
    fn test_category_tree_survives_cycle() {
        let tree = build_category_tree(vec![
            category(1, "A", Some(2)),
            category(2, "B", Some(1)),
            category(3, "Root", None),
        ]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_assemble_groups_sizes_by_color() {
        let detail = assemble_detail(vec![
            row(20, "Sand", 203, "L", 3, 2),
            row(10, "Navy", 101, "S", 1, 4),
            row(20, "Sand", 201, "S", 1, 0),
            row(10, "Navy", 102, "M", 2, 1),
        ])
        .unwrap();

        let colors: Vec<_> = detail.colors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(colors, ["Navy", "Sand"]);

        let sand: Vec<_> = detail.colors[1]
            .sizes
            .iter()
            .map(|s| (s.name.as_str(), s.available()))
            .collect();
        assert_eq!(sand, [("S", false), ("L", true)]);
        assert_eq!(detail.price.display(), "$49.00");
    }

    #[test]
    fn test_assemble_discards_incomplete_rows() {
        let mut no_stock = row(10, "Navy", 102, "M", 2, 1);
        no_stock.stock = None;
        let mut no_size = row(10, "Navy", 103, "L", 3, 1);
        no_size.size_name = None;
        let mut no_variant = row(30, "Red", 301, "S", 1, 5);
        no_variant.variant_id = None;

        let detail = assemble_detail(vec![
            row(10, "Navy", 101, "S", 1, 4),
            no_stock,
            no_size,
            no_variant,
        ])
        .unwrap();

        assert_eq!(detail.colors.len(), 1);
        assert_eq!(detail.colors[0].sizes.len(), 1);
    }

    #[test]
    fn test_assemble_hides_inactive_or_sold_out() {
        let mut inactive = row(10, "Navy", 101, "S", 1, 4);
        inactive.active = false;
        assert!(assemble_detail(vec![inactive]).is_none());

        assert!(assemble_detail(vec![row(10, "Navy", 101, "S", 1, 0)]).is_none());
        assert!(assemble_detail(Vec::new()).is_none());
    }

    #[test]
    fn test_assemble_merges_wishlist_flag_per_color() {
        let mut wished = row(10, "Navy", 102, "M", 2, 1);
        wished.in_wishlist = true;
        let detail = assemble_detail(vec![row(10, "Navy", 101, "S", 1, 4), wished]).unwrap();
        assert!(detail.colors[0].in_wishlist);
    }
}
