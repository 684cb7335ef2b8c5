//! Address book tests.
//!
//! Requires a `PostgreSQL` database in `TEST_DATABASE_URL`.

use threadline_core::UserId;
use threadline_integration_tests::TestDb;
use threadline_storefront::db::AddressRepository;
use threadline_storefront::models::{Address, NewAddress};

async fn create(db: &TestDb, user: UserId, name: &str) -> Address {
    let new = NewAddress::new(
        name,
        "9 Spool Lane",
        Some("Unit 4"),
        "Leeds",
        "West Yorkshire",
        "LS1 4AP",
        "gb",
        None,
    )
    .expect("valid address");
    AddressRepository::new(&db.pool)
        .create(user, &new)
        .await
        .expect("address insert failed")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_first_address_becomes_default() {
    let db = TestDb::connect().await;
    let user = db.user().await;

    let first = create(&db, user, "Ada Lovelace").await;
    let second = create(&db, user, "Charles Babbage").await;

    assert!(first.is_default);
    assert!(!second.is_default);
    assert_eq!(first.country_code, "GB");

    let all = AddressRepository::new(&db.pool)
        .list(user)
        .await
        .expect("list failed");
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|a| a.is_default).count(), 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_delete_is_scoped_to_owner() {
    let db = TestDb::connect().await;
    let owner = db.user().await;
    let other = db.user().await;
    let address = create(&db, owner, "Ada Lovelace").await;
    let repo = AddressRepository::new(&db.pool);

    assert!(!repo.delete(other, address.id).await.expect("delete failed"));
    assert!(
        repo.get(owner, address.id)
            .await
            .expect("get failed")
            .is_some()
    );

    assert!(repo.delete(owner, address.id).await.expect("delete failed"));
    assert!(repo.list(owner).await.expect("list failed").is_empty());
}
