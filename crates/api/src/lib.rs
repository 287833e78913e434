//! HTTP API server for the name purchase platform.
//!
//! Thin adapters over the orchestrator: order creation/read/retry, the
//! payment webhook, batch availability, plus health and Prometheus metrics,
//! with structured logging (tracing) on every route.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + Clone + Send + Sync + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/retry", post(routes::orders::retry::<S>))
        .route("/webhooks/pingpay", post(routes::webhooks::pingpay::<S>))
        .route("/names/check", get(routes::names::check::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state with default wiring.
///
/// The payment gateway is real when an API key is configured, in-memory
/// otherwise. Chain signers are injected behind traits; this default wiring
/// uses the in-memory implementations; deployments with custody keys build
/// their own `AppState` with real clients in their place.
pub fn create_default_state<S: OrderStore + Clone + Send + Sync + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    use orchestrator::Orchestrator;
    use payments::{InMemoryPaymentGateway, PaymentGateway, PingPayClient};
    use registration::{
        ArbDriver, AvailabilityChecker, BaseDriver, DriverSet, EnsDriver, FixedAvailability,
        InMemoryArbController, InMemoryBasenameController, InMemoryEnsController,
        InMemoryNearRpc, InMemoryNearWallet, InMemorySnsGateway, InMemorySolanaWallet,
        NearDriver, SnsDriver,
    };
    use swap::{InMemoryBridge, InMemorySettlementWallet, PlatformWallets, SwapExecutor};

    let gateway: Arc<dyn PaymentGateway> = if config.pingpay_api_key.is_empty() {
        Arc::new(InMemoryPaymentGateway::new())
    } else {
        Arc::new(PingPayClient::new(&config.pingpay_api_key, &config.app_url))
    };

    let availability: Arc<dyn AvailabilityChecker> = Arc::new(FixedAvailability::new());

    let settlement = Arc::new(InMemorySettlementWallet::with_balance("1000000000"));
    let bridge = Arc::new(InMemoryBridge::new());
    let swap = SwapExecutor::new(bridge, settlement.clone());

    let wallets = PlatformWallets {
        evm_address: "0x00a329c0648769A73afAc7F9381E08FB43dBEA72".to_string(),
        solana_address: "7NsngNMtXJNdHgeK4znQDZ5PJ19ykVvQvEF7BT5KFjMv".to_string(),
        near_account_id: "platform.near".to_string(),
    };

    let drivers = DriverSet::new(
        EnsDriver::new(Arc::new(InMemoryEnsController::new())),
        BaseDriver::new(Arc::new(InMemoryBasenameController::new())),
        SnsDriver::new(
            Arc::new(InMemorySnsGateway::new()),
            Arc::new(InMemorySolanaWallet::new()),
        ),
        NearDriver::new(
            Arc::new(InMemoryNearRpc::new()),
            Arc::new(InMemoryNearWallet::new()),
        ),
        ArbDriver::new(Arc::new(InMemoryArbController::new())),
    );

    let orchestrator = Orchestrator::start(
        store,
        gateway,
        availability.clone(),
        swap,
        settlement,
        wallets,
        drivers,
    );

    Arc::new(AppState {
        orchestrator,
        availability,
        webhook_secret: config.pingpay_webhook_secret.clone(),
    })
}
