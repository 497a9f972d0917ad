use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Category, DocumentStore, ListManager, ListPatch, Money, PersistenceError, ProductDraft,
    Quantity, QuantityUnit, SqlDocumentStore, StoreError, compute_total,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn store_with_db() -> (SqlDocumentStore, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    (SqlDocumentStore::new(db.clone()), db)
}

fn draft(name: &str, price: i64, category: Category) -> ProductDraft {
    ProductDraft {
        store: "Mercado Central".to_string(),
        name: name.to_string(),
        price: Money::new(price),
        purchase_date: NaiveDate::from_ymd_opt(2024, 3, 9),
        quantity: Quantity::from_units(1),
        quantity_unit: QuantityUnit::Unit,
        category: Some(category),
        brand: None,
    }
}

fn filled_manager() -> ListManager {
    let mut manager = ListManager::new();
    manager
        .add_product(ProductDraft {
            quantity: Quantity::from_thousandths(1250),
            quantity_unit: QuantityUnit::Kg,
            brand: Some("Zenú".to_string()),
            ..draft("Chicken", 1890, Category::MeatFish)
        })
        .unwrap();
    let soda = manager
        .add_product(draft("Soda", 350, Category::Beverages))
        .unwrap()
        .id;
    manager
        .add_product(draft("Bread", 220, Category::Bakery))
        .unwrap();
    manager.set_active(soda, false).unwrap();
    manager
}

#[tokio::test]
async fn saved_list_reads_back_unchanged() {
    let (store, _db) = store_with_db().await;
    let mut manager = filled_manager();
    let expected_products = manager.products().to_vec();
    let expected_total = manager.total();

    let saved = manager.save(&store, "alice").await.unwrap();
    assert!(manager.is_empty());
    assert_eq!(manager.total(), Money::ZERO);
    assert_eq!(manager.store(), "Mercado Central");

    let lists = store.query_lists_by_owner("alice").await.unwrap();
    assert_eq!(lists.len(), 1);
    let list = &lists[0];
    assert_eq!(list.id, saved.id);
    assert_eq!(list.store, "Mercado Central");
    assert_eq!(list.products, expected_products);
    assert_eq!(list.total, expected_total);
    assert_eq!(list.total, Money::new(1890 + 220));
    assert!(list.total_is_consistent());
    assert!(!list.products[1].active);
    assert_eq!(
        list.created_at.map(|d| d.timestamp()),
        saved.created_at.map(|d| d.timestamp())
    );
    assert_eq!(list.updated_at, None);
}

#[tokio::test]
async fn empty_list_is_not_saved() {
    let (store, _db) = store_with_db().await;
    let mut manager = ListManager::new();

    let err = manager.save(&store, "alice").await.unwrap_err();
    assert!(matches!(err, PersistenceError::EmptyList));
    assert!(store.query_lists_by_owner("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn lists_are_scoped_to_owner_and_oldest_first() {
    let (store, _db) = store_with_db().await;

    let mut manager = ListManager::new();
    manager.add_product(draft("Milk", 250, Category::DairyEggs)).unwrap();
    let recent = manager.save(&store, "alice").await.unwrap();

    manager.add_product(draft("Eggs", 600, Category::DairyEggs)).unwrap();
    let older = manager
        .save_at(&store, "alice", Utc.with_ymd_and_hms(2023, 11, 2, 8, 0, 0).single())
        .await
        .unwrap();

    manager.add_product(draft("Tea", 410, Category::Beverages)).unwrap();
    manager.save(&store, "bob").await.unwrap();

    let lists = store.query_lists_by_owner("alice").await.unwrap();
    let ids: Vec<_> = lists.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![older.id, recent.id]);
    assert!(lists.iter().all(|l| l.owner_id == "alice"));
    assert_eq!(store.query_lists_by_owner("bob").await.unwrap().len(), 1);
    assert!(store.query_lists_by_owner("carol").await.unwrap().is_empty());
}

#[tokio::test]
async fn undated_lists_survive_the_round_trip() {
    let (store, _db) = store_with_db().await;
    let mut manager = ListManager::new();
    manager.add_product(draft("Rice", 300, Category::Pantry)).unwrap();

    manager.save_at(&store, "alice", None).await.unwrap();

    let lists = store.query_lists_by_owner("alice").await.unwrap();
    assert_eq!(lists[0].created_at, None);
}

#[tokio::test]
async fn update_list_replaces_products_and_stamps_update() {
    let (store, _db) = store_with_db().await;
    let mut manager = filled_manager();
    let mut list = manager.save(&store, "alice").await.unwrap();

    let removed = list.products[0].id;
    list.remove_product(removed).unwrap();
    let updated_at = store
        .update_list(list.id, ListPatch::products_of(&list))
        .await
        .unwrap();

    let reloaded = store.query_lists_by_owner("alice").await.unwrap().remove(0);
    assert_eq!(reloaded.products, list.products);
    assert!(reloaded.product(removed).is_none());
    assert_eq!(reloaded.total, Money::new(220));
    assert_eq!(reloaded.total, compute_total(&reloaded.products));
    assert_eq!(reloaded.updated_at, Some(updated_at));

    store
        .update_list(
            list.id,
            ListPatch {
                store: Some("Corner Shop".to_string()),
                ..ListPatch::default()
            },
        )
        .await
        .unwrap();
    let renamed = store.query_lists_by_owner("alice").await.unwrap().remove(0);
    assert_eq!(renamed.store, "Corner Shop");
    assert_eq!(renamed.products, list.products);
}

#[tokio::test]
async fn update_of_unknown_list_is_not_found() {
    let (store, _db) = store_with_db().await;

    let err = store
        .update_list(Uuid::new_v4(), ListPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
