//! Payment processor webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use payments::{SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookEvent, verify_signature};
use serde_json::{Value, json};
use store::OrderStore;

use crate::routes::orders::AppState;

/// POST /webhooks/pingpay — inbound payment notification.
///
/// Always acknowledges with `{"received": true}`: an unauthenticated caller
/// learns nothing from the response, and the processor has no reason to
/// retry-storm. Invalid signatures, malformed payloads and unknown events
/// change no state.
#[tracing::instrument(skip_all)]
pub async fn pingpay<S: OrderStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(&state.webhook_secret, timestamp, &body, signature) {
        tracing::debug!("webhook signature rejected");
        return received();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable webhook payload");
            return received();
        }
    };

    if let Err(e) = state.orchestrator.handle_payment_webhook(event).await {
        tracing::warn!(error = %e, "webhook processing failed");
    }

    received()
}

fn received() -> Json<Value> {
    Json(json!({ "received": true }))
}
