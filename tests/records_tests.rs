use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use locascan::auth::StaticSession;
use locascan::database::{Database, MemoryDatabase, Reference};
use locascan::error::{Error, Result};
use locascan::models::{Coordinates, LocationIcon, ProductScan, StorageLocation};
use locascan::records::Collection;

struct Fixture {
    db: Arc<MemoryDatabase>,
    sessions: Arc<StaticSession>,
    products: Collection<ProductScan>,
    locations: Collection<StorageLocation>,
}

fn signed_in(uid: &str) -> Fixture {
    let db = Arc::new(MemoryDatabase::new());
    let sessions = Arc::new(StaticSession::signed_in(uid, Some("ana@example.com")));
    let products = Collection::new(db.clone(), sessions.clone());
    let locations = products.sibling();
    Fixture {
        db,
        sessions,
        products,
        locations,
    }
}

#[tokio::test]
async fn created_scan_lists_with_stamped_fields() {
    let fx = signed_in("u1");
    let before = Utc::now();

    let scan = ProductScan::new("012345", "Widget", 3).at(Coordinates::new(10.123456, 20.654321));
    let id = fx.products.create(&scan).await.unwrap();

    let listed = fx.products.list_all().await;
    assert_eq!(listed.len(), 1);
    let stored = &listed[0];
    assert!(!id.is_empty());
    assert_eq!(stored.id.as_deref(), Some(id.as_str()));
    assert_eq!(stored.barcode, "012345");
    assert_eq!(stored.product_name, "Widget");
    assert_eq!(stored.quantity, 3);
    assert_eq!(stored.latitude, 10.123456);
    assert_eq!(stored.longitude, 20.654321);
    assert_eq!(stored.user_id.as_deref(), Some("u1"));
    assert_eq!(stored.user_email.as_deref(), Some("ana@example.com"));
    assert!((stored.scan_date - before).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn create_while_signed_out_writes_nothing() {
    let fx = signed_in("u1");
    fx.sessions.set(None);

    let result = fx.products.create(&ProductScan::new("1", "Widget", 1)).await;
    assert!(matches!(result, Err(Error::Unauthenticated)));
    assert!(fx.db.snapshot().is_null());
    assert!(fx.products.list_all().await.is_empty());
}

#[tokio::test]
async fn signed_out_reads_are_empty() {
    let fx = signed_in("u1");
    let id = fx.products.create(&ProductScan::new("1", "Widget", 1)).await.unwrap();
    fx.sessions.set(None);

    assert!(fx.products.list_all().await.is_empty());
    assert!(fx.products.get_by_id(&id).await.is_none());
    assert!(!fx.products.delete(&id).await);
}

#[tokio::test]
async fn products_list_newest_first() {
    let fx = signed_in("u1");
    let now = Utc::now();
    let partition = Reference::root().child("product_scans/u1");
    for (key, name, age) in [("-Na", "old", 60), ("-Nb", "newest", 0), ("-Nc", "middle", 30)] {
        let date = (now - Duration::minutes(age)).to_rfc3339();
        fx.db
            .put(
                &partition.child(key),
                json!({"Barcode": key, "ProductName": name, "Quantity": 1, "ScanDate": date}),
                "",
            )
            .await
            .unwrap();
    }

    let names: Vec<String> = fx
        .products
        .list_all()
        .await
        .into_iter()
        .map(|p| p.product_name)
        .collect();
    assert_eq!(names, ["newest", "middle", "old"]);
}

#[tokio::test]
async fn locations_list_by_name_ignoring_case() {
    let fx = signed_in("u1");
    for name in ["shelf", "Back room", "attic", "Shelf"] {
        fx.locations.create(&StorageLocation::new(name)).await.unwrap();
    }

    let names: Vec<String> = fx
        .locations
        .list_all()
        .await
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, ["attic", "Back room", "shelf", "Shelf"]);
}

#[tokio::test]
async fn update_keeps_id_and_scan_date() {
    let fx = signed_in("u1");
    fx.products
        .create(&ProductScan::new("012345", "Widget", 3))
        .await
        .unwrap();
    let original = fx.products.list_all().await.remove(0);

    let mut changed = original.clone();
    changed.product_name = "Gadget".to_string();
    changed.quantity = 7;
    changed.barcode = "999".to_string();
    assert!(fx.products.update(&changed).await);

    let listed = fx.products.list_all().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, original.id);
    assert_eq!(listed[0].scan_date, original.scan_date);
    assert_eq!(listed[0].product_name, "Gadget");
    assert_eq!(listed[0].quantity, 7);
}

#[tokio::test]
async fn update_without_id_fails() {
    let fx = signed_in("u1");
    assert!(!fx.products.update(&ProductScan::new("1", "Widget", 1)).await);
    assert!(fx.db.snapshot().is_null());
}

#[tokio::test]
async fn update_keeps_owner_stamp() {
    let fx = signed_in("u1");
    let id = fx.products.create(&ProductScan::new("1", "Widget", 1)).await.unwrap();

    let mut replacement = ProductScan::new("1", "Widget", 2);
    replacement.id = Some(id.clone());
    assert!(fx.products.update(&replacement).await);

    let stored = fx.products.get_by_id(&id).await.unwrap();
    assert_eq!(stored.user_id.as_deref(), Some("u1"));
    assert_eq!(stored.user_email.as_deref(), Some("ana@example.com"));
}

#[tokio::test]
async fn deleted_record_is_gone() {
    let fx = signed_in("u1");
    let keep = fx.products.create(&ProductScan::new("1", "Keep", 1)).await.unwrap();
    let gone = fx.products.create(&ProductScan::new("2", "Gone", 1)).await.unwrap();

    assert!(fx.products.delete(&gone).await);

    let ids: Vec<String> = fx
        .products
        .list_all()
        .await
        .into_iter()
        .filter_map(|p| p.id)
        .collect();
    assert_eq!(ids, [keep]);
    assert!(fx.products.get_by_id(&gone).await.is_none());
    assert!(matches!(
        fx.products.try_get_by_id(&gone).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn partitions_are_private() {
    let db = Arc::new(MemoryDatabase::new());
    let ana = Arc::new(StaticSession::signed_in("u1", None));
    let bo = Arc::new(StaticSession::signed_in("u2", None));
    let anas: Collection<ProductScan> = Collection::new(db.clone(), ana);
    let bos: Collection<ProductScan> = Collection::new(db.clone(), bo);

    let id = anas.create(&ProductScan::new("1", "Widget", 1)).await.unwrap();

    assert!(bos.list_all().await.is_empty());
    assert!(bos.get_by_id(&id).await.is_none());
    // Deleting a missing key in one's own partition leaves the other intact.
    bos.delete(&id).await;
    assert_eq!(anas.list_all().await.len(), 1);
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let fx = signed_in("u1");
    fx.products.create(&ProductScan::new("ABC-123", "Blue Widget", 1)).await.unwrap();
    fx.products.create(&ProductScan::new("xyz-789", "Red gadget", 1)).await.unwrap();

    let by_barcode = fx.products.search_by_barcode("abc").await;
    assert_eq!(by_barcode.len(), 1);
    assert_eq!(by_barcode[0].barcode, "ABC-123");

    let by_name = fx.products.search_by_name("GADGET").await;
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].product_name, "Red gadget");

    assert_eq!(fx.products.search_by_name("").await.len(), 2);
}

#[tokio::test]
async fn count_by_location_is_recomputed_each_call() {
    let fx = signed_in("u1");
    let shelf_id = fx.locations.create(&StorageLocation::new("Shelf")).await.unwrap();
    let shelf = fx.locations.get_by_id(&shelf_id).await.unwrap();

    fx.products
        .create(&ProductScan::new("1", "A", 1).stored_in(&shelf))
        .await
        .unwrap();
    fx.products.create(&ProductScan::new("2", "B", 1)).await.unwrap();
    assert_eq!(fx.products.count_by_location(&shelf_id).await, 1);

    let second = fx
        .products
        .create(&ProductScan::new("3", "C", 1).stored_in(&shelf))
        .await
        .unwrap();
    assert_eq!(fx.products.count_by_location(&shelf_id).await, 2);

    fx.products.delete(&second).await;
    assert_eq!(fx.products.count_by_location(&shelf_id).await, 1);
    assert_eq!(fx.products.list_by_location(&shelf_id).await[0].product_name, "A");
}

#[tokio::test]
async fn list_with_counts_fills_product_count() {
    let fx = signed_in("u1");
    let shelf_id = fx.locations.create(&StorageLocation::new("Shelf")).await.unwrap();
    let attic_id = fx
        .locations
        .create(&StorageLocation::new("Attic").with_icon(LocationIcon::Home))
        .await
        .unwrap();
    let shelf = fx.locations.get_by_id(&shelf_id).await.unwrap();
    for n in 0..3 {
        fx.products
            .create(&ProductScan::new(&n.to_string(), "x", 1).stored_in(&shelf))
            .await
            .unwrap();
    }

    let listed = fx.locations.list_with_counts().await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id.as_deref(), Some(attic_id.as_str()));
    assert_eq!(listed[0].product_count, 0);
    assert_eq!(listed[0].icon_emoji, LocationIcon::Home);
    assert_eq!(listed[1].product_count, 3);
}

#[tokio::test]
async fn deleting_location_leaves_dangling_references() {
    let fx = signed_in("u1");
    let shelf_id = fx.locations.create(&StorageLocation::new("Shelf")).await.unwrap();
    let shelf = fx.locations.get_by_id(&shelf_id).await.unwrap();
    let product_id = fx
        .products
        .create(&ProductScan::new("1", "Widget", 1).stored_in(&shelf))
        .await
        .unwrap();

    assert!(fx.locations.delete(&shelf_id).await);

    assert!(fx.locations.get_by_id(&shelf_id).await.is_none());
    let product = fx.products.get_by_id(&product_id).await.unwrap();
    assert_eq!(product.location_id.as_deref(), Some(shelf_id.as_str()));
    assert_eq!(product.location_name.as_deref(), Some("Shelf"));
    assert_eq!(fx.products.count_by_location(&shelf_id).await, 1);
}

#[tokio::test]
async fn unreadable_records_are_skipped() {
    let db = Arc::new(MemoryDatabase::with_data(json!({
        "product_scans": {
            "u1": {
                "-Na": {"Barcode": "1", "ProductName": "Good", "Quantity": 2},
                "-Nb": {"Barcode": "2", "ProductName": "Bad", "Quantity": "many"},
                "-Nc": "not a record"
            }
        }
    })));
    let sessions = Arc::new(StaticSession::signed_in("u1", None));
    let products: Collection<ProductScan> = Collection::new(db, sessions);

    let listed = products.try_list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].product_name, "Good");
    assert_eq!(listed[0].id.as_deref(), Some("-Na"));
}

#[tokio::test]
async fn ids_that_are_not_single_keys_are_refused() {
    let fx = signed_in("u1");
    let keep = fx.products.create(&ProductScan::new("012345", "Widget", 1)).await.unwrap();
    fx.products.create(&ProductScan::new("999", "Gadget", 2)).await.unwrap();

    for id in ["", "/", "//", "a.b", "#", "$x", "[0]"] {
        assert!(!fx.products.delete(id).await, "delete {:?}", id);
        assert!(fx.products.get_by_id(id).await.is_none(), "get {:?}", id);
        assert!(matches!(
            fx.products.try_get_by_id(id).await,
            Err(Error::NotFound(_))
        ));

        let mut replacement = ProductScan::new("1", "Overwrite", 1);
        replacement.id = Some(id.to_string());
        assert!(!fx.products.update(&replacement).await, "update {:?}", id);
    }

    let names: Vec<String> = fx
        .products
        .list_all()
        .await
        .into_iter()
        .map(|p| p.product_name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Widget".to_string()));
    assert!(fx.products.get_by_id(&keep).await.is_some());
}

#[tokio::test]
async fn nested_path_ids_cannot_touch_fields() {
    let fx = signed_in("u1");
    let id = fx.products.create(&ProductScan::new("012345", "Widget", 1)).await.unwrap();
    let field = format!("{}/Barcode", id);

    assert!(!fx.products.delete(&field).await);
    assert!(fx.products.get_by_id(&field).await.is_none());

    let mut patch = ProductScan::new("", "", 1);
    patch.id = Some(field);
    assert!(!fx.products.update(&patch).await);

    let stored = fx.products.get_by_id(&id).await.unwrap();
    assert_eq!(stored.barcode, "012345");
    assert_eq!(stored.product_name, "Widget");
}

/// A backend that rejects every request
struct UnreachableDatabase;

#[async_trait]
impl Database for UnreachableDatabase {
    async fn push(&self, _at: &Reference, _value: Value, _token: &str) -> Result<String> {
        Err(unreachable_error())
    }

    async fn get(&self, _at: &Reference, _token: &str) -> Result<Option<Value>> {
        Err(unreachable_error())
    }

    async fn put(&self, _at: &Reference, _value: Value, _token: &str) -> Result<()> {
        Err(unreachable_error())
    }

    async fn delete(&self, _at: &Reference, _token: &str) -> Result<()> {
        Err(unreachable_error())
    }
}

fn unreachable_error() -> Error {
    Error::Api {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

fn unreachable_products() -> Collection<ProductScan> {
    Collection::new(
        Arc::new(UnreachableDatabase),
        Arc::new(StaticSession::signed_in("u1", Some("ana@example.com"))),
    )
}

#[tokio::test]
async fn failed_reads_degrade_to_empty() {
    let products = unreachable_products();

    assert!(products.list_all().await.is_empty());
    assert!(products.search_by_name("widget").await.is_empty());
    assert_eq!(products.count_by_location("-Nshelf").await, 0);
    assert!(products.get_by_id("-Na").await.is_none());

    assert!(matches!(
        products.try_list_all().await,
        Err(Error::Api { status: 503, .. })
    ));
    assert!(matches!(
        products.try_get_by_id("-Na").await,
        Err(Error::Api { status: 503, .. })
    ));
}

#[tokio::test]
async fn failed_writes_are_reported() {
    let products = unreachable_products();

    match products.create(&ProductScan::new("1", "Widget", 1)).await {
        Err(Error::RemoteWrite(message)) => assert!(message.contains("503")),
        other => panic!("expected RemoteWrite error, got {:?}", other),
    }

    let mut existing = ProductScan::new("1", "Widget", 1);
    existing.id = Some("-Na".to_string());
    assert!(!products.update(&existing).await);
    assert!(!products.delete("-Na").await);
}
