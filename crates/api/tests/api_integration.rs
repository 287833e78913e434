//! HTTP-level integration tests over in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use api::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::OrderId;
use domain::OrderStatus;
use orchestrator::Orchestrator;
use payments::{InMemoryPaymentGateway, SIGNATURE_HEADER, TIMESTAMP_HEADER, sign};
use registration::{
    ArbDriver, BaseDriver, DriverSet, EnsDriver, FixedAvailability, InMemoryArbController,
    InMemoryBasenameController, InMemoryEnsController, InMemoryNearRpc, InMemoryNearWallet,
    InMemorySnsGateway, InMemorySolanaWallet, NearDriver, SnsDriver,
};
use serde_json::{Value, json};
use store::{InMemoryOrderStore, OrderStore};
use swap::{InMemoryBridge, InMemorySettlementWallet, PlatformWallets, SwapExecutor};
use tower::ServiceExt;

const WEBHOOK_SECRET: &str = "whsec_test";

struct Harness {
    app: Router,
    store: InMemoryOrderStore,
    gateway: Arc<InMemoryPaymentGateway>,
    availability: Arc<FixedAvailability>,
}

fn setup() -> Harness {
    let store = InMemoryOrderStore::new();
    let gateway = Arc::new(InMemoryPaymentGateway::new());
    let availability = Arc::new(FixedAvailability::new());

    let near_rpc = InMemoryNearRpc::new();
    near_rpc.add_key("buyer.near", "ed25519:BuyerKey111");

    let drivers = DriverSet::new(
        EnsDriver::new(Arc::new(InMemoryEnsController::new()))
            .with_commitment_delay(Duration::ZERO),
        BaseDriver::new(Arc::new(InMemoryBasenameController::new())),
        SnsDriver::new(
            Arc::new(InMemorySnsGateway::new()),
            Arc::new(InMemorySolanaWallet::new()),
        ),
        NearDriver::new(Arc::new(near_rpc), Arc::new(InMemoryNearWallet::new())),
        ArbDriver::new(Arc::new(InMemoryArbController::new()))
            .with_commitment_delay(Duration::ZERO),
    );

    let settlement = Arc::new(InMemorySettlementWallet::with_balance("9000000"));
    let swap = SwapExecutor::new(Arc::new(InMemoryBridge::new()), settlement.clone())
        .with_timing(Duration::from_millis(1), Duration::from_millis(250));

    let orchestrator = Orchestrator::start(
        store.clone(),
        gateway.clone(),
        availability.clone(),
        swap,
        settlement,
        PlatformWallets {
            evm_address: "0x00a329c0648769A73afAc7F9381E08FB43dBEA72".to_string(),
            solana_address: "7NsngNMtXJNdHgeK4znQDZ5PJ19ykVvQvEF7BT5KFjMv".to_string(),
            near_account_id: "platform.near".to_string(),
        },
        drivers,
    );

    let state = Arc::new(AppState {
        orchestrator,
        availability: availability.clone() as Arc<dyn registration::AvailabilityChecker>,
        webhook_secret: WEBHOOK_SECRET.to_string(),
    });

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();

    Harness {
        app: api::create_app(state, metrics_handle),
        store,
        gateway,
        availability,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_near_order(harness: &Harness) -> (String, String) {
    let (status, body) = send(
        &harness.app,
        post_json(
            "/orders",
            json!({
                "name": "pulse.near",
                "chain": "near",
                "ownerAddress": "buyer.near",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let order_id = body["order_id"].as_str().unwrap().to_string();
    let order = harness
        .store
        .find_order(&OrderId::from_string(order_id.clone()))
        .await
        .unwrap()
        .unwrap();
    (order_id, order.payment_session_id.unwrap())
}

async fn wait_for_status(store: &InMemoryOrderStore, id: &str, status: OrderStatus) {
    let order_id = OrderId::from_string(id);
    for _ in 0..400 {
        if let Some(order) = store.find_order(&order_id).await.unwrap()
            && order.status == status
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {status}");
}

#[tokio::test]
async fn test_health() {
    let harness = setup();
    let (status, body) = send(&harness.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_order_and_read_it_back() {
    let harness = setup();
    let (order_id, _session) = create_near_order(&harness).await;

    let (status, body) = send(&harness.app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "PENDING_PAYMENT");
    assert_eq!(body["order"]["name"], "pulse.near");
    assert_eq!(body["order"]["price"], 150);
    assert_eq!(body["events"][0]["kind"], "PENDING_PAYMENT");
}

#[tokio::test]
async fn test_create_order_validation_errors() {
    let harness = setup();

    let (status, body) = send(
        &harness.app,
        post_json(
            "/orders",
            json!({ "name": "pulse.com", "chain": "near", "ownerAddress": "buyer.near" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");

    harness.availability.mark_taken("pulse.near");
    let (status, body) = send(
        &harness.app,
        post_json(
            "/orders",
            json!({ "name": "pulse.near", "chain": "near", "ownerAddress": "buyer.near" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NAME_UNAVAILABLE");
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let harness = setup();
    let (status, body) = send(&harness.app, get("/orders/doesnotexist1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn test_retry_rejected_while_pending() {
    let harness = setup();
    let (order_id, _) = create_near_order(&harness).await;

    let (status, body) = send(
        &harness.app,
        post_json(&format!("/orders/{order_id}/retry"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "RETRY_NOT_ALLOWED");
}

#[tokio::test]
async fn test_webhook_with_invalid_signature_changes_nothing() {
    let harness = setup();
    let (order_id, session_id) = create_near_order(&harness).await;
    harness.gateway.complete_session(&session_id, "pay-1");

    let payload = json!({
        "id": "evt-1",
        "type": "payment.success",
        "resourceId": session_id,
        "createdAt": "2026-01-01T00:00:00Z",
    })
    .to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/pingpay")
        .header(header::CONTENT_TYPE, "application/json")
        .header(TIMESTAMP_HEADER, "1700000000")
        .header(SIGNATURE_HEADER, "deadbeef")
        .body(Body::from(payload))
        .unwrap();

    // The sender still sees success.
    let (status, body) = send(&harness.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    // No event, no status change.
    let order_id = OrderId::from_string(order_id);
    let order = harness.store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    let events = harness.store.events_for_order(&order_id).await.unwrap();
    assert_eq!(events.len(), 1); // only PENDING_PAYMENT
}

#[tokio::test]
async fn test_webhook_with_valid_signature_confirms_and_registers() {
    let harness = setup();
    let (order_id, session_id) = create_near_order(&harness).await;
    harness.gateway.complete_session(&session_id, "pay-1");

    let payload = json!({
        "id": "evt-1",
        "type": "payment.success",
        "resourceId": session_id,
        "createdAt": "2026-01-01T00:00:00Z",
    })
    .to_string();
    let timestamp = "1700000000";
    let signature = sign(WEBHOOK_SECRET, timestamp, payload.as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/pingpay")
        .header(header::CONTENT_TYPE, "application/json")
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .unwrap();

    let (status, body) = send(&harness.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    wait_for_status(&harness.store, &order_id, OrderStatus::Registered).await;

    let (_, body) = send(&harness.app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(body["order"]["status"], "REGISTERED");
    assert!(body["order"]["registration_tx"].is_string());
    assert!(body["order"]["swap_tx"].is_null());
}

#[tokio::test]
async fn test_names_check() {
    let harness = setup();
    harness.availability.mark_taken("pulse.eth");

    let (status, body) = send(
        &harness.app,
        get("/names/check?names=pulse.eth,pulse.sol,garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["domain"], "pulse.eth");
    assert_eq!(results[0]["available"], false);
    assert_eq!(results[1]["domain"], "pulse.sol");
    assert_eq!(results[1]["available"], true);

    let (status, _) = send(&harness.app, get("/names/check?names=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
