//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::OrderId;
use domain::{Chain, Money, Order, OrderStatus};
use serde_json::json;
use store::{OrderStore, OrderUpdate, PostgresOrderStore, StoreError};
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

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresOrderStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    let store = PostgresOrderStore::new(pool);
    store.run_migrations().await.unwrap();

    sqlx::query("TRUNCATE TABLE order_events, orders")
        .execute(store.pool())
        .await
        .unwrap();

    store
}

fn test_order() -> Order {
    Order::new(
        "pulse.eth",
        Chain::Ethereum,
        Money::from_cents(900),
        "0x253553366Da8546fC250F225fe3d25d0C782303b",
    )
    .with_session("cs-0001")
}

#[tokio::test]
async fn test_insert_and_find_roundtrip() {
    let store = get_test_store().await;
    let order = test_order();
    let id = order.id.clone();

    store.insert_order(order.clone()).await.unwrap();

    let found = store.find_order(&id).await.unwrap().unwrap();
    assert_eq!(found.id, order.id);
    assert_eq!(found.name, "pulse.eth");
    assert_eq!(found.chain, Chain::Ethereum);
    assert_eq!(found.price, Money::from_cents(900));
    assert_eq!(found.status, OrderStatus::PendingPayment);
    assert_eq!(found.payment_session_id.as_deref(), Some("cs-0001"));
}

#[tokio::test]
async fn test_insert_duplicate_is_rejected() {
    let store = get_test_store().await;
    let order = test_order();
    store.insert_order(order.clone()).await.unwrap();

    let result = store.insert_order(order).await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
}

#[tokio::test]
async fn test_find_by_payment_ref() {
    let store = get_test_store().await;
    let order = test_order();
    let id = order.id.clone();
    store.insert_order(order).await.unwrap();

    let by_session = store.find_by_payment_ref("cs-0001").await.unwrap().unwrap();
    assert_eq!(by_session.id, id);

    store
        .apply(&id, OrderUpdate::default().payment_id("pay-42"))
        .await
        .unwrap();
    let by_payment = store.find_by_payment_ref("pay-42").await.unwrap().unwrap();
    assert_eq!(by_payment.id, id);

    assert!(store.find_by_payment_ref("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_apply_patches_projection() {
    let store = get_test_store().await;
    let order = test_order();
    let id = order.id.clone();
    store.insert_order(order).await.unwrap();

    let updated = store
        .apply(
            &id,
            OrderUpdate::status(OrderStatus::PaymentConfirmed)
                .payment_id("pay-1")
                .paid_at(chrono::Utc::now()),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::PaymentConfirmed);
    assert_eq!(updated.payment_id.as_deref(), Some("pay-1"));
    assert!(updated.paid_at.is_some());

    // clear on success
    store
        .apply(
            &id,
            OrderUpdate::status(OrderStatus::RegistrationFailed).registration_error("boom"),
        )
        .await
        .unwrap();
    let cleared = store
        .apply(
            &id,
            OrderUpdate::status(OrderStatus::Registered)
                .registration_tx("0xabc")
                .clear_registration_error(),
        )
        .await
        .unwrap();
    assert_eq!(cleared.registration_error, None);
    assert_eq!(cleared.registration_tx.as_deref(), Some("0xabc"));

    let reread = store.find_order(&id).await.unwrap().unwrap();
    assert_eq!(reread.status, OrderStatus::Registered);
    assert_eq!(reread.registration_error, None);
}

#[tokio::test]
async fn test_apply_unknown_order_fails() {
    let store = get_test_store().await;
    let result = store
        .apply(
            &OrderId::from("missing"),
            OrderUpdate::status(OrderStatus::Expired),
        )
        .await;
    assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
async fn test_events_roundtrip_in_append_order() {
    let store = get_test_store().await;
    let order = test_order();
    let id = order.id.clone();
    store.insert_order(order).await.unwrap();

    store
        .append_event(&id, "PENDING_PAYMENT", Some(json!({"sessionId": "cs-0001"})))
        .await
        .unwrap();
    store.append_event(&id, "PAYMENT_CONFIRMED", None).await.unwrap();
    store
        .append_event(&id, "PROGRESS", Some(json!({"step": "Submitting commitment..."})))
        .await
        .unwrap();

    let events = store.events_for_order(&id).await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].kind, "PENDING_PAYMENT");
    assert_eq!(
        events[0].payload,
        Some(json!({"sessionId": "cs-0001"}))
    );
    assert_eq!(events[1].kind, "PAYMENT_CONFIRMED");
    assert_eq!(events[1].payload, None);
    assert_eq!(events[2].kind, "PROGRESS");
    assert!(events[0].created_at <= events[2].created_at);
}

#[tokio::test]
async fn test_append_event_enforces_foreign_key() {
    let store = get_test_store().await;
    let result = store
        .append_event(&OrderId::from("missing"), "PROGRESS", None)
        .await;
    assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = get_test_store().await;
    store.run_migrations().await.unwrap();
    store.run_migrations().await.unwrap();
}
