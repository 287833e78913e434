//! Order creation, read, and retry endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{Chain, OrderWithEvents};
use orchestrator::{CreateOrderRequest, Orchestrator};
use registration::AvailabilityChecker;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use store::OrderStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S>
where
    S: OrderStore + Clone + Send + Sync + 'static,
{
    pub orchestrator: Arc<Orchestrator<S>>,
    pub availability: Arc<dyn AvailabilityChecker>,
    pub webhook_secret: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderBody {
    pub name: String,
    pub chain: Chain,
    #[serde(rename = "ownerAddress")]
    pub owner_address: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub name: String,
    pub chain: Chain,
    pub tld: String,
    pub price_cents: i64,
    pub payment_url: String,
}

// -- Handlers --

/// POST /orders — create an order and open a checkout session.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: OrderStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(axum::http::StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let created = state
        .orchestrator
        .create_order(CreateOrderRequest {
            name: body.name,
            chain: body.chain,
            owner_address: body.owner_address,
        })
        .await?;

    let response = OrderCreatedResponse {
        order_id: created.order.id.to_string(),
        name: created.order.name,
        chain: created.order.chain,
        tld: created.order.tld,
        price_cents: created.order.price.cents(),
        payment_url: created.payment_url,
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /orders/{id} — read an order with its event log.
///
/// This is the polling entry point: pending orders get a throttled payment
/// verification probe before the read returns.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderWithEvents>, ApiError> {
    let order_id = OrderId::from_string(id);
    let result = state.orchestrator.get_order(&order_id).await?;
    Ok(Json(result))
}

/// POST /orders/{id}/retry — re-enter the saga after a failed registration.
#[tracing::instrument(skip(state))]
pub async fn retry<S: OrderStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let order_id = OrderId::from_string(id);
    state.orchestrator.retry(&order_id).await?;
    Ok(Json(json!({ "status": "retrying" })))
}
