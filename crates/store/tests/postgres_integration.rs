//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and clear the
//! tables before each test, so they run serially.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use common::{BeerId, Money, PageRequest, Version};
use domain::{
    Beer, BeerFields, BeerOrder, BeerOrderShipment, Customer, CustomerFields, OrderDraft,
    OrderLineDraft, OrderStatus, ShipmentDraft, UnknownBeerPolicy,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    BeerFilter, BeerOrderRepository, BeerRepository, BeerRepositoryExt, CustomerRepository,
    PostgresStore, ShipmentRepository, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_beer_order_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE beer_order_shipment, beer_order_line, beer_order, customer, beer RESTART IDENTITY",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

fn beer_fields(name: &str, style: &str) -> BeerFields {
    BeerFields {
        name: name.to_string(),
        style: style.to_string(),
        upc: "0631234200036".to_string(),
        quantity_on_hand: 100,
        price: Money::from_cents(1299),
        description: Some("Crisp".to_string()),
    }
}

async fn save_beer(store: &PostgresStore, name: &str) -> BeerId {
    store
        .save_beer(Beer::new(beer_fields(name, "IPA")).unwrap())
        .await
        .unwrap()
        .id
        .unwrap()
}

async fn build_order(store: &PostgresStore, beer_ids: &[BeerId]) -> BeerOrder {
    let refs = store.find_beer_refs(beer_ids).await.unwrap();
    let draft = OrderDraft {
        customer_id: None,
        customer_ref: Some("PO-1".to_string()),
        payment_amount: Money::from_cents(2598),
        status: None,
        lines: beer_ids.iter().map(|&id| OrderLineDraft::new(id, 2)).collect(),
        shipments: Vec::new(),
    };
    BeerOrder::from_draft(&draft, |id| refs.get(&id).cloned(), UnknownBeerPolicy::Reject).unwrap()
}

fn shipment_draft(carrier: &str) -> ShipmentDraft {
    ShipmentDraft {
        shipment_date: NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
        carrier: Some(carrier.to_string()),
        tracking_number: Some("1Z999".to_string()),
    }
}

#[tokio::test]
#[serial]
async fn beer_round_trips_through_database() {
    let store = get_test_store().await;

    let saved = store
        .save_beer(Beer::new(beer_fields("Galaxy Haze", "IPA")).unwrap())
        .await
        .unwrap();
    let found = store
        .find_beer_by_id(saved.id.unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.name, "Galaxy Haze");
    assert_eq!(found.price, Money::from_cents(1299));
    assert_eq!(found.audit.version, Version::initial());
    assert!(found.audit.created_date.is_some());
}

#[tokio::test]
#[serial]
async fn beer_update_with_stale_version_conflicts() {
    let store = get_test_store().await;
    let saved = store
        .save_beer(Beer::new(beer_fields("Galaxy Haze", "IPA")).unwrap())
        .await
        .unwrap();

    let mut fresh = saved.clone();
    fresh.quantity_on_hand = 40;
    let updated = store.save_beer(fresh).await.unwrap();
    assert_eq!(updated.audit.version, Version::new(1));

    let result = store.save_beer(saved).await;
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
}

#[tokio::test]
#[serial]
async fn beers_filter_and_page() {
    let store = get_test_store().await;
    for i in 0..5 {
        store
            .save_beer(Beer::new(beer_fields(&format!("Haze {i}"), "IPA")).unwrap())
            .await
            .unwrap();
    }
    store
        .save_beer(Beer::new(beer_fields("Midnight", "Stout")).unwrap())
        .await
        .unwrap();

    let page = store
        .find_all_beers(&BeerFilter::new().name("haze"), PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].name, "Haze 2");

    let page = store
        .find_all_beers(&BeerFilter::new().style("stout"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 1);
}

#[tokio::test]
#[serial]
async fn order_aggregate_is_saved_and_loaded_whole() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let b = save_beer(&store, "B").await;

    let mut order = build_order(&store, &[a, b]).await;
    order.add_shipment(BeerOrderShipment::new(shipment_draft("UPS")));
    let saved = store.save_order(order).await.unwrap();
    let order_id = saved.id().unwrap();

    let loaded = store.find_order_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(loaded.status(), OrderStatus::New);
    assert_eq!(loaded.lines().len(), 2);
    assert_eq!(loaded.shipments().len(), 1);
    assert!(
        loaded
            .lines()
            .iter()
            .all(|line| line.beer_order_id() == Some(order_id))
    );
    assert_eq!(loaded.lines()[1].beer.as_ref().unwrap().name, "B");
    assert!(loaded.shipments()[0].belongs_to(order_id));
}

#[tokio::test]
#[serial]
async fn rebuilding_lines_deletes_previous_rows() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let b = save_beer(&store, "B").await;
    let saved = store
        .save_order(build_order(&store, &[a, b]).await)
        .await
        .unwrap();
    let old_line_ids: Vec<_> = saved.lines().iter().map(|l| l.id.unwrap()).collect();

    let refs = store.find_beer_refs(&[b]).await.unwrap();
    let mut order = saved;
    order
        .apply_update(
            &OrderDraft {
                customer_id: None,
                customer_ref: None,
                payment_amount: Money::from_cents(1299),
                status: Some(OrderStatus::Paid),
                lines: vec![OrderLineDraft::new(b, 1)],
                shipments: Vec::new(),
            },
            |id| refs.get(&id).cloned(),
            UnknownBeerPolicy::Reject,
        )
        .unwrap();
    let updated = store.save_order(order).await.unwrap();

    let loaded = store
        .find_order_by_id(updated.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status(), OrderStatus::Paid);
    assert_eq!(loaded.audit().version, Version::new(1));
    assert_eq!(loaded.lines().len(), 1);
    assert!(!old_line_ids.contains(&loaded.lines()[0].id.unwrap()));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM beer_order_line")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[serial]
async fn beer_referenced_by_line_is_not_deleted() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    store
        .save_order(build_order(&store, &[a]).await)
        .await
        .unwrap();

    let result = store.delete_beer_by_id(a).await;
    assert!(matches!(result, Err(StoreError::Referenced { .. })));
    assert!(store.exists_beer_by_id(a).await.unwrap());
}

#[tokio::test]
#[serial]
async fn order_with_unknown_customer_is_rejected() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let refs = store.find_beer_refs(&[a]).await.unwrap();
    let order = BeerOrder::from_draft(
        &OrderDraft {
            customer_id: Some(common::CustomerId::new(404)),
            customer_ref: None,
            payment_amount: Money::from_cents(100),
            status: None,
            lines: vec![OrderLineDraft::new(a, 1)],
            shipments: Vec::new(),
        },
        |id| refs.get(&id).cloned(),
        UnknownBeerPolicy::Reject,
    )
    .unwrap();

    let result = store.save_order(order).await;
    assert!(matches!(
        result,
        Err(StoreError::MissingReference { entity: "Customer" })
    ));
    assert_eq!(
        store
            .find_all_orders(PageRequest::default())
            .await
            .unwrap()
            .total_elements,
        0
    );
}

#[tokio::test]
#[serial]
async fn deleting_customer_keeps_orders() {
    let store = get_test_store().await;
    let customer = store
        .save_customer(
            Customer::new(CustomerFields {
                name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                phone_number: None,
                address_line1: "1 Main St".to_string(),
                address_line2: None,
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62701".to_string(),
            })
            .unwrap(),
        )
        .await
        .unwrap();
    let customer_id = customer.id.unwrap();
    let a = save_beer(&store, "A").await;
    let refs = store.find_beer_refs(&[a]).await.unwrap();
    let order = BeerOrder::from_draft(
        &OrderDraft {
            customer_id: Some(customer_id),
            customer_ref: None,
            payment_amount: Money::from_cents(100),
            status: None,
            lines: vec![OrderLineDraft::new(a, 1)],
            shipments: Vec::new(),
        },
        |id| refs.get(&id).cloned(),
        UnknownBeerPolicy::Reject,
    )
    .unwrap();
    let order_id = store.save_order(order).await.unwrap().id().unwrap();

    assert_eq!(
        store
            .find_orders_by_customer(customer_id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(store.delete_customer_by_id(customer_id).await.unwrap());

    let order = store.find_order_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.customer_id(), None);
}

#[tokio::test]
#[serial]
async fn deleting_order_cascades_to_children() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let mut order = build_order(&store, &[a]).await;
    order.add_shipment(BeerOrderShipment::new(shipment_draft("DHL")));
    let saved = store.save_order(order).await.unwrap();
    let shipment_id = saved.shipments()[0].id.unwrap();

    assert!(store.delete_order_by_id(saved.id().unwrap()).await.unwrap());
    assert!(store.find_shipment_by_id(shipment_id).await.unwrap().is_none());
    assert!(store.delete_beer_by_id(a).await.unwrap());
}

#[tokio::test]
#[serial]
async fn shipment_update_checks_parent_and_version() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let mut order = store
        .save_order(build_order(&store, &[a]).await)
        .await
        .unwrap();
    let order_id = order.id().unwrap();

    let attached = order
        .add_shipment(BeerOrderShipment::new(shipment_draft("UPS")))
        .clone();
    let saved = store.save_shipment(attached).await.unwrap();
    assert!(saved.belongs_to(order_id));

    let mut changed = saved.clone();
    changed.update_details(shipment_draft("FedEx"));
    let changed = store.save_shipment(changed).await.unwrap();
    assert_eq!(changed.audit.version, Version::new(1));

    let result = store.save_shipment(saved).await;
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));

    let listed = store.find_shipments_by_order(order_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].carrier.as_deref(), Some("FedEx"));
}

#[tokio::test]
#[serial]
async fn saving_order_does_not_rewrite_stored_shipments() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let mut order = build_order(&store, &[a]).await;
    order.add_shipment(BeerOrderShipment::new(shipment_draft("UPS")));
    let order = store.save_order(order).await.unwrap();
    let shipment_id = order.shipments()[0].id.unwrap();

    let mut changed = order.shipments()[0].clone();
    changed.update_details(shipment_draft("DHL"));
    store.save_shipment(changed).await.unwrap();

    // The order still carries the shipment as it was loaded.
    let saved = store.save_order(order).await.unwrap();

    let stored = store.find_shipment_by_id(shipment_id).await.unwrap().unwrap();
    assert_eq!(stored.carrier.as_deref(), Some("DHL"));
    assert_eq!(stored.audit.version, Version::new(1));
    assert_eq!(saved.find_shipment(shipment_id), Some(&stored));
}

#[tokio::test]
#[serial]
async fn order_reads_never_mix_versions_with_concurrent_saves() {
    let store = get_test_store().await;
    let a = save_beer(&store, "A").await;
    let b = save_beer(&store, "B").await;
    let refs = store.find_beer_refs(&[a, b]).await.unwrap();
    let order = store
        .save_order(build_order(&store, &[a]).await)
        .await
        .unwrap();
    let order_id = order.id().unwrap();

    // Each write stores as many lines as its payment amount in cents.
    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            let mut order = order;
            for round in 0..40 {
                let beer_ids = if round % 2 == 0 { vec![a, b] } else { vec![b] };
                order
                    .apply_update(
                        &OrderDraft {
                            customer_id: None,
                            customer_ref: None,
                            payment_amount: Money::from_cents(beer_ids.len() as i64),
                            status: None,
                            lines: beer_ids.iter().map(|&id| OrderLineDraft::new(id, 1)).collect(),
                            shipments: Vec::new(),
                        },
                        |id| refs.get(&id).cloned(),
                        UnknownBeerPolicy::Reject,
                    )
                    .unwrap();
                order = store.save_order(order).await.unwrap();
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..80 {
                let loaded = store.find_order_by_id(order_id).await.unwrap().unwrap();
                if loaded.audit().version != Version::initial() {
                    assert_eq!(
                        loaded.lines().len() as i64,
                        loaded.payment_amount().cents()
                    );
                }
                assert!(!loaded.lines().is_empty());
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}
