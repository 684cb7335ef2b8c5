//! Integration test support for Threadline.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable database; migrations are applied automatically
//! export TEST_DATABASE_URL=postgres://localhost/threadline_test
//! cargo test -p threadline-integration-tests -- --ignored
//!
//! # HTTP tests also need a running storefront
//! export STOREFRONT_BASE_URL=http://localhost:3000
//! ```
//!
//! Every fixture is tagged with a random token (names, slugs, emails) so
//! tests can share one database and run in parallel.

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use threadline_core::{CategoryId, Gender, ProductId, UserId, VariantId, VariantSizeId};
use threadline_storefront::db::create_pool;

/// A migrated test database.
pub struct TestDb {
    pub pool: PgPool,
}

/// A product with one color variant and its sizes.
#[derive(Debug, Clone)]
pub struct ProductFixture {
    /// Token embedded in every name created for this fixture.
    pub tag: String,
    pub category_id: CategoryId,
    pub category_slug: String,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    /// One SKU per entry of the stock slice, in the same order.
    pub sizes: Vec<VariantSizeId>,
}

/// A unique lowercase token for fixture names.
#[must_use]
pub fn unique_tag() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("fx{}", simple.chars().take(12).collect::<String>())
}

impl TestDb {
    /// Connect to `TEST_DATABASE_URL` and apply migrations.
    ///
    /// # Panics
    ///
    /// Panics if the variable is unset or the database is unreachable.
    pub async fn connect() -> Self {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let pool = create_pool(&SecretString::from(url))
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool }
    }

    /// Insert a user with a unique email and no password.
    pub async fn user(&self) -> UserId {
        sqlx::query_scalar::<_, UserId>(
            "INSERT INTO storefront.user (email) VALUES ($1) RETURNING id",
        )
        .bind(format!("{}@test.threadline.dev", unique_tag()))
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert user")
    }

    /// Insert a top-level category, optionally under `parent`.
    pub async fn category(&self, parent: Option<CategoryId>) -> (CategoryId, String) {
        let slug = unique_tag();
        let id = sqlx::query_scalar::<_, CategoryId>(
            r"
            INSERT INTO storefront.category (name, slug, parent_id)
            VALUES ($1, $1, $2)
            RETURNING id
            ",
        )
        .bind(&slug)
        .bind(parent)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert category");
        (id, slug)
    }

    /// Insert an active product in its own category with one color whose
    /// sizes carry the given stock.
    pub async fn product(&self, gender: Gender, price: &str, stock: &[i32]) -> ProductFixture {
        let (category_id, category_slug) = self.category(None).await;
        self.product_in(category_id, &category_slug, gender, price, stock)
            .await
    }

    /// Like [`TestDb::product`] but in an existing category.
    pub async fn product_in(
        &self,
        category_id: CategoryId,
        category_slug: &str,
        gender: Gender,
        price: &str,
        stock: &[i32],
    ) -> ProductFixture {
        let tag = unique_tag();
        let price: Decimal = price.parse().expect("Invalid fixture price");

        let product_id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO storefront.product (name, description, price, gender, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(format!("Product {tag}"))
        .bind(format!("Fixture product {tag}"))
        .bind(price)
        .bind(gender)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert product");

        let (variant_id, sizes) = self.color_variant(product_id, "#336699", stock).await;

        ProductFixture {
            tag,
            category_id,
            category_slug: category_slug.to_owned(),
            product_id,
            variant_id,
            sizes,
        }
    }

    /// Add a color variant to a product. Sizes are created fresh and sorted
    /// in slice order.
    pub async fn color_variant(
        &self,
        product_id: ProductId,
        hex: &str,
        stock: &[i32],
    ) -> (VariantId, Vec<VariantSizeId>) {
        let tag = unique_tag();
        let color_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO storefront.color (name, hex_code) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("Color {tag}"))
        .bind(hex)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert color");

        let variant_id = sqlx::query_scalar::<_, VariantId>(
            r"
            INSERT INTO storefront.product_variant (product_id, color_id, image_url)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(color_id)
        .bind(format!("https://placehold.co/600x800?text={tag}"))
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert variant");

        let mut sizes = Vec::with_capacity(stock.len());
        for (position, units) in (0_i32..).zip(stock) {
            let size_id = sqlx::query_scalar::<_, i32>(
                "INSERT INTO storefront.size (name, sort_order) VALUES ($1, $2) RETURNING id",
            )
            .bind(format!("Size {position} {tag}"))
            .bind(position)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert size");

            let id = sqlx::query_scalar::<_, VariantSizeId>(
                r"
                INSERT INTO storefront.product_variant_size (product_variant_id, size_id, stock)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(variant_id)
            .bind(size_id)
            .bind(*units)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert SKU");
            sizes.push(id);
        }

        (variant_id, sizes)
    }

    /// Move a category under a new parent. Unlike inserts, this can close a
    /// parent loop.
    pub async fn set_parent(&self, category_id: CategoryId, parent: Option<CategoryId>) {
        sqlx::query("UPDATE storefront.category SET parent_id = $2 WHERE id = $1")
            .bind(category_id)
            .bind(parent)
            .execute(&self.pool)
            .await
            .expect("Failed to update category parent");
    }

    /// Hide a product from the storefront.
    pub async fn deactivate(&self, product_id: ProductId) {
        sqlx::query("UPDATE storefront.product SET active = FALSE WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .expect("Failed to deactivate product");
    }

    /// Overwrite a SKU's stock.
    pub async fn set_stock(&self, variant_size_id: VariantSizeId, stock: i32) {
        sqlx::query("UPDATE storefront.product_variant_size SET stock = $2 WHERE id = $1")
            .bind(variant_size_id)
            .bind(stock)
            .execute(&self.pool)
            .await
            .expect("Failed to update stock");
    }

    /// Current stock of a SKU.
    pub async fn stock(&self, variant_size_id: VariantSizeId) -> i32 {
        sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM storefront.product_variant_size WHERE id = $1",
        )
        .bind(variant_size_id)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to read stock")
    }
}
