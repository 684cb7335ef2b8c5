//! Cart repository tests: add/merge, stock limits, and line ownership.
//!
//! Requires a `PostgreSQL` database in `TEST_DATABASE_URL`.

use tokio::task::JoinSet;

use threadline_core::{Gender, Quantity, VariantSizeId};
use threadline_integration_tests::TestDb;
use threadline_storefront::db::{CartRepository, RepositoryError};

fn qty(n: u32) -> Quantity {
    Quantity::new(n).expect("valid quantity")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_add_to_empty_cart_creates_one_line() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Women, "20.00", &[5]).await;
    let user = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let outcome = carts
        .add(user, fixture.sizes[0], qty(1))
        .await
        .expect("add failed");
    assert!(outcome.created);
    assert_eq!(outcome.quantity.get(), 1);

    let cart = carts.cart(user).await.expect("cart failed");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.item_count(), 1);
    assert!(!cart.lines[0].can_decrement());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_adding_same_sku_increments_quantity() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Men, "20.00", &[5]).await;
    let user = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let first = carts.add(user, fixture.sizes[0], qty(1)).await.expect("add failed");
    let second = carts.add(user, fixture.sizes[0], qty(2)).await.expect("add failed");

    assert_eq!(first.line_id, second.line_id);
    assert!(!second.created);
    assert_eq!(second.quantity.get(), 3);

    let cart = carts.cart(user).await.expect("cart failed");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(carts.count(user).await.expect("count failed"), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_concurrent_adds_do_not_lose_updates() {
    const ADDS: u32 = 8;

    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Women, "20.00", &[20]).await;
    let user = db.user().await;
    let sku = fixture.sizes[0];

    let mut tasks = JoinSet::new();
    for _ in 0..ADDS {
        let pool = db.pool.clone();
        tasks.spawn(async move { CartRepository::new(&pool).add(user, sku, qty(1)).await });
    }

    let mut created = 0;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.expect("task panicked").expect("add failed");
        if outcome.created {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let carts = CartRepository::new(&db.pool);
    let cart = carts.cart(user).await.expect("cart failed");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity.get(), ADDS);
    assert_eq!(carts.count(user).await.expect("count failed"), ADDS);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_add_beyond_stock_is_refused() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Women, "20.00", &[2]).await;
    let user = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let too_many = carts.add(user, fixture.sizes[0], qty(3)).await;
    assert!(matches!(too_many, Err(RepositoryError::InsufficientStock)));

    carts.add(user, fixture.sizes[0], qty(2)).await.expect("add failed");
    let one_more = carts.add(user, fixture.sizes[0], qty(1)).await;
    assert!(matches!(one_more, Err(RepositoryError::InsufficientStock)));

    assert_eq!(carts.count(user).await.expect("count failed"), 2);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_add_unknown_or_inactive_sku_is_not_found() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Unisex, "20.00", &[2]).await;
    let user = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let unknown = carts.add(user, VariantSizeId::new(i32::MAX), qty(1)).await;
    assert!(matches!(unknown, Err(RepositoryError::NotFound)));

    db.deactivate(fixture.product_id).await;
    let inactive = carts.add(user, fixture.sizes[0], qty(1)).await;
    assert!(matches!(inactive, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_increment_and_decrement_bounds() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Women, "20.00", &[2]).await;
    let user = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let line = carts.add(user, fixture.sizes[0], qty(1)).await.expect("add failed").line_id;

    assert!(!carts.decrement(user, line).await.expect("decrement failed"));
    assert!(carts.increment(user, line).await.expect("increment failed"));
    assert!(!carts.increment(user, line).await.expect("increment failed"));
    assert_eq!(carts.count(user).await.expect("count failed"), 2);

    assert!(carts.decrement(user, line).await.expect("decrement failed"));
    assert!(!carts.decrement(user, line).await.expect("decrement failed"));
    assert_eq!(carts.count(user).await.expect("count failed"), 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_lines_are_scoped_to_owner() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Men, "20.00", &[5]).await;
    let owner = db.user().await;
    let intruder = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let line = carts.add(owner, fixture.sizes[0], qty(2)).await.expect("add failed").line_id;

    assert!(!carts.increment(intruder, line).await.expect("increment failed"));
    assert!(!carts.decrement(intruder, line).await.expect("decrement failed"));
    assert!(!carts.remove(intruder, line).await.expect("remove failed"));
    assert_eq!(carts.count(owner).await.expect("count failed"), 2);

    assert!(carts.remove(owner, line).await.expect("remove failed"));
    assert!(!carts.remove(owner, line).await.expect("remove failed"));
    assert!(carts.cart(owner).await.expect("cart failed").is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_cart_view_for_user_without_cart_is_empty() {
    let db = TestDb::connect().await;
    let user = db.user().await;
    let carts = CartRepository::new(&db.pool);

    let cart = carts.cart(user).await.expect("cart failed");
    assert!(cart.is_empty());
    assert_eq!(carts.count(user).await.expect("count failed"), 0);
}
