//! Orchestrator entry points.

use std::sync::Arc;

use chrono::Utc;
use common::OrderId;
use domain::{Chain, Order, OrderStatus, OrderWithEvents, pricing, validation};
use payments::{PaymentGateway, PaymentReconciler, WebhookEvent, WebhookKind};
use registration::{AvailabilityChecker, DriverSet};
use serde_json::json;
use store::{OrderStore, OrderUpdate};
use swap::{PlatformWallets, SettlementWallet, SwapExecutor};
use tokio::sync::mpsc;

use crate::error::{OrchestratorError, Result};
use crate::events::{ConfirmationSource, event_kind};
use crate::locks::OrderLocks;
use crate::saga::SagaJob;

/// A validated request to purchase a name.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// Full name, e.g. `pulse.eth`.
    pub name: String,
    pub chain: Chain,
    /// Buyer wallet that will own the name.
    pub owner_address: String,
}

/// A freshly created order plus the hosted checkout URL.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub payment_url: String,
}

/// The saga coordinator.
///
/// Every mutation of an order flows through here: creation, the two payment
/// confirmation paths, retry, expiry, and the registration saga itself.
/// Sagas run as detached tasks fed through an internal queue: callers get
/// an acknowledgement, never the saga's outcome.
pub struct Orchestrator<S>
where
    S: OrderStore + Clone + Send + Sync + 'static,
{
    pub(crate) store: S,
    pub(crate) gateway: Arc<dyn PaymentGateway>,
    pub(crate) reconciler: PaymentReconciler,
    pub(crate) availability: Arc<dyn AvailabilityChecker>,
    pub(crate) swap: SwapExecutor,
    pub(crate) settlement: Arc<dyn SettlementWallet>,
    pub(crate) wallets: PlatformWallets,
    pub(crate) drivers: DriverSet,
    pub(crate) locks: OrderLocks,
    pub(crate) saga_tx: mpsc::UnboundedSender<SagaJob>,
}

impl<S> Orchestrator<S>
where
    S: OrderStore + Clone + Send + Sync + 'static,
{
    /// Builds the orchestrator and spawns its saga dispatcher.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        store: S,
        gateway: Arc<dyn PaymentGateway>,
        availability: Arc<dyn AvailabilityChecker>,
        swap: SwapExecutor,
        settlement: Arc<dyn SettlementWallet>,
        wallets: PlatformWallets,
        drivers: DriverSet,
    ) -> Arc<Self> {
        let (saga_tx, saga_rx) = mpsc::unbounded_channel();
        let reconciler = PaymentReconciler::new(gateway.clone());

        let orchestrator = Arc::new(Self {
            store,
            gateway,
            reconciler,
            availability,
            swap,
            settlement,
            wallets,
            drivers,
            locks: OrderLocks::new(),
            saga_tx,
        });

        let dispatcher = Arc::clone(&orchestrator);
        tokio::spawn(async move { dispatcher.dispatch_sagas(saga_rx).await });

        orchestrator
    }

    /// Creates an order: validate, check availability, price, open a
    /// checkout session, persist in `PENDING_PAYMENT`.
    #[tracing::instrument(skip(self, request), fields(name = %request.name, chain = %request.chain))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<CreatedOrder> {
        let label =
            validation::validate_order(&request.name, request.chain, &request.owner_address)?;

        let check = self.availability.check(&label, request.chain).await;
        if !check.available {
            return Err(OrchestratorError::NameUnavailable(request.name));
        }

        let price = pricing::price_for(request.chain, &label);
        let order = Order::new(&request.name, request.chain, price, &request.owner_address);

        let session = self.gateway.create_session(price, &order.id).await?;
        let order = order.with_session(session.session_id.clone());

        self.store.insert_order(order.clone()).await?;
        self.store
            .append_event(
                &order.id,
                OrderStatus::PendingPayment.as_str(),
                Some(json!({
                    "name": order.name,
                    "chain": order.chain,
                    "priceCents": price.cents(),
                    "ownerAddress": order.owner_address,
                    "sessionId": session.session_id,
                })),
            )
            .await?;

        metrics::counter!("orders_created").increment(1);
        tracing::info!(order_id = %order.id, price = %price, "order created");

        Ok(CreatedOrder {
            order,
            payment_url: session.session_url,
        })
    }

    /// Loads an order or fails with `OrderNotFound`.
    async fn load(&self, order_id: &OrderId) -> Result<Order> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| OrchestratorError::OrderNotFound(order_id.clone()))
    }

    /// Confirms payment for an order and launches the registration saga.
    ///
    /// Idempotent: the decision is re-made under the per-order lock, so the
    /// webhook and polling paths racing on one order produce exactly one
    /// transition and one saga. Any state past `PENDING_PAYMENT` makes this
    /// a no-op. The lock-free pre-check lets late signals for an order whose
    /// saga currently holds the lock return immediately.
    #[tracing::instrument(skip(self, payment_ref), fields(order_id = %order_id, source = %source))]
    pub async fn confirm_payment(
        &self,
        order_id: &OrderId,
        payment_ref: Option<String>,
        source: ConfirmationSource,
    ) -> Result<()> {
        if !self.load(order_id).await?.status.can_confirm_payment() {
            return Ok(());
        }

        let _guard = self.locks.acquire(order_id).await;

        let order = self.load(order_id).await?;
        if !order.status.can_confirm_payment() {
            tracing::debug!(status = %order.status, "payment already processed, ignoring");
            return Ok(());
        }

        let mut update = OrderUpdate::status(OrderStatus::PaymentConfirmed).paid_at(Utc::now());
        if let Some(reference) = &payment_ref {
            update = update.payment_id(reference.clone());
        }
        self.store.apply(order_id, update).await?;
        self.store
            .append_event(
                order_id,
                OrderStatus::PaymentConfirmed.as_str(),
                Some(json!({ "paymentId": payment_ref, "source": source })),
            )
            .await?;

        metrics::counter!("payments_confirmed").increment(1);
        tracing::info!("payment confirmed, queueing registration saga");

        let _ = self.saga_tx.send(SagaJob {
            order_id: order_id.clone(),
        });
        Ok(())
    }

    /// Reads an order with its event log.
    ///
    /// This is the polling entry point: while the order is still awaiting
    /// payment, a throttled verification probe runs first and confirms on
    /// success, so buyers who never trigger the webhook still converge.
    pub async fn get_order(&self, order_id: &OrderId) -> Result<OrderWithEvents> {
        let mut order = self.load(order_id).await?;

        if let Some(verification) = self.reconciler.poll_verify(&order).await
            && verification.verified
        {
            self.confirm_payment(order_id, verification.payment_id, ConfirmationSource::Polling)
                .await?;
            order = self.load(order_id).await?;
        }

        let events = self.store.events_for_order(order_id).await?;
        Ok(OrderWithEvents { order, events })
    }

    /// Accepts a retry for a failed registration.
    ///
    /// Accepted only from exactly `REGISTRATION_FAILED`; returns once the
    /// saga is queued, not when it finishes.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn retry(&self, order_id: &OrderId) -> Result<()> {
        let order = self.load(order_id).await?;
        if !order.status.can_retry() {
            return Err(OrchestratorError::RetryNotAllowed {
                status: order.status,
            });
        }

        let _guard = self.locks.acquire(order_id).await;

        let order = self.load(order_id).await?;
        if !order.status.can_retry() {
            return Err(OrchestratorError::RetryNotAllowed {
                status: order.status,
            });
        }

        self.store
            .append_event(order_id, event_kind::RETRY_REQUESTED, None)
            .await?;
        metrics::counter!("registration_retries").increment(1);
        tracing::info!("retry accepted, queueing registration saga");

        let _ = self.saga_tx.send(SagaJob {
            order_id: order_id.clone(),
        });
        Ok(())
    }

    /// Expires an order whose checkout session timed out.
    ///
    /// Only `PENDING_PAYMENT` orders can expire; anything else is a no-op.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn expire_order(&self, order_id: &OrderId) -> Result<()> {
        if !self.load(order_id).await?.status.can_expire() {
            return Ok(());
        }

        let _guard = self.locks.acquire(order_id).await;

        if !self.load(order_id).await?.status.can_expire() {
            return Ok(());
        }

        self.store
            .apply(order_id, OrderUpdate::status(OrderStatus::Expired))
            .await?;
        self.store
            .append_event(order_id, OrderStatus::Expired.as_str(), None)
            .await?;
        tracing::info!("order expired");
        Ok(())
    }

    /// Processes an authenticated webhook notification.
    ///
    /// The caller has already verified the signature. Unknown kinds, unknown
    /// orders and already-advanced orders are ignored without error; the
    /// endpoint acknowledges everything.
    #[tracing::instrument(skip(self, event), fields(kind = %event.kind, resource = %event.resource_id))]
    pub async fn handle_payment_webhook(&self, event: WebhookEvent) -> Result<()> {
        let Some(kind) = WebhookKind::parse(&event.kind) else {
            tracing::debug!("ignoring webhook kind");
            return Ok(());
        };

        let Some(order) = self.store.find_by_payment_ref(&event.resource_id).await? else {
            tracing::debug!("webhook does not match any order");
            return Ok(());
        };

        if kind == WebhookKind::SessionExpired {
            return self.expire_order(&order.id).await;
        }

        if order.status.is_past_confirmation() || order.status == OrderStatus::Expired {
            return Ok(());
        }

        self.store
            .append_event(
                &order.id,
                event_kind::WEBHOOK_RECEIVED,
                Some(json!({
                    "id": event.id,
                    "type": event.kind,
                    "resourceId": event.resource_id,
                })),
            )
            .await?;

        let Some(session_id) = order.payment_session_id.clone() else {
            return Ok(());
        };

        // The webhook is a hint, not proof: always verify against the
        // processor before confirming.
        let verification = self.reconciler.verify(&session_id).await;
        if !verification.verified {
            self.store
                .append_event(
                    &order.id,
                    event_kind::PAYMENT_UNVERIFIED,
                    Some(json!({ "resourceId": event.resource_id })),
                )
                .await?;
            return Ok(());
        }

        let payment_ref = verification.payment_id.or(Some(event.resource_id));
        self.confirm_payment(&order.id, payment_ref, ConfirmationSource::Webhook)
            .await
    }
}
