//! Wishlist repository tests: set semantics and toggling.
//!
//! Requires a `PostgreSQL` database in `TEST_DATABASE_URL`.

use threadline_core::{Gender, VariantId};
use threadline_integration_tests::TestDb;
use threadline_storefront::db::{RepositoryError, WishlistRepository};

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_add_twice_keeps_one_row() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Women, "35.00", &[1]).await;
    let user = db.user().await;
    let wishlist = WishlistRepository::new(&db.pool);

    assert!(wishlist.add(user, fixture.variant_id).await.expect("add failed"));
    assert!(!wishlist.add(user, fixture.variant_id).await.expect("add failed"));

    let items = wishlist.list(user).await.expect("list failed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].variant_id, fixture.variant_id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_remove_twice_is_not_an_error() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Men, "35.00", &[1]).await;
    let user = db.user().await;
    let wishlist = WishlistRepository::new(&db.pool);

    wishlist.add(user, fixture.variant_id).await.expect("add failed");
    assert!(wishlist.remove(user, fixture.variant_id).await.expect("remove failed"));
    assert!(!wishlist.remove(user, fixture.variant_id).await.expect("remove failed"));
    assert!(wishlist.list(user).await.expect("list failed").is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_toggle_flips_membership() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Unisex, "35.00", &[1]).await;
    let user = db.user().await;
    let wishlist = WishlistRepository::new(&db.pool);

    assert!(wishlist.toggle(user, fixture.variant_id).await.expect("toggle failed"));
    assert!(wishlist.contains(user, fixture.variant_id).await.expect("contains failed"));

    assert!(!wishlist.toggle(user, fixture.variant_id).await.expect("toggle failed"));
    assert!(!wishlist.contains(user, fixture.variant_id).await.expect("contains failed"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_unknown_variant_is_not_found() {
    let db = TestDb::connect().await;
    let user = db.user().await;
    let wishlist = WishlistRepository::new(&db.pool);

    let result = wishlist.add(user, VariantId::new(i32::MAX)).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_wishlists_are_per_user() {
    let db = TestDb::connect().await;
    let fixture = db.product(Gender::Women, "35.00", &[1]).await;
    let alice = db.user().await;
    let bob = db.user().await;
    let wishlist = WishlistRepository::new(&db.pool);

    wishlist.add(alice, fixture.variant_id).await.expect("add failed");

    assert!(wishlist.contains(alice, fixture.variant_id).await.expect("contains failed"));
    assert!(!wishlist.contains(bob, fixture.variant_id).await.expect("contains failed"));
}
