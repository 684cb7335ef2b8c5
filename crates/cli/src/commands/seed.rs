//! Demo catalog seeding.
//!
//! Loads a small clothing catalog: a two-level category tree, colors, sizes,
//! products with color variants, and per-size stock. Every insert is
//! conflict-tolerant, so running the command twice leaves one copy.

use sqlx::PgPool;

use super::CommandError;

const CATALOG_SQL: &str = include_str!("../../seed/catalog.sql");

/// Row counts after seeding.
#[derive(Debug, sqlx::FromRow)]
struct CatalogCounts {
    categories: i64,
    products: i64,
    variants: i64,
    skus: i64,
}

/// Seed the demo catalog in a single transaction.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is written in that case.
pub async fn run(pool: &PgPool) -> Result<(), CommandError> {
    tracing::info!("Seeding demo catalog...");

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(CATALOG_SQL).execute(&mut *tx).await?;
    tx.commit().await?;

    let counts = sqlx::query_as::<_, CatalogCounts>(
        r"
        SELECT
            (SELECT COUNT(*) FROM storefront.category) AS categories,
            (SELECT COUNT(*) FROM storefront.product) AS products,
            (SELECT COUNT(*) FROM storefront.product_variant) AS variants,
            (SELECT COUNT(*) FROM storefront.product_variant_size) AS skus
        ",
    )
    .fetch_one(pool)
    .await?;

    tracing::info!(
        categories = counts.categories,
        products = counts.products,
        variants = counts.variants,
        skus = counts.skus,
        "Demo catalog ready"
    );
    Ok(())
}
