//! The registration saga.
//!
//! Confirmed orders are queued as jobs; a dispatcher task spawns one
//! detached task per job. The saga is not transactional across its steps:
//! once funds are swapped there is no rollback, only forward recovery. A
//! completed swap is persisted before the registration call so a retry
//! resumes past it instead of swapping twice.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::OrderId;
use domain::{Order, OrderStatus};
use registration::Progress;
use serde_json::json;
use store::{OrderStore, OrderUpdate};
use tokio::sync::mpsc;

use crate::error::{OrchestratorError, Result};
use crate::events::event_kind;
use crate::orchestrator::Orchestrator;

/// One queued saga execution.
pub(crate) struct SagaJob {
    pub order_id: OrderId,
}

/// What the saga persists on success.
struct SagaSuccess {
    registration_tx: String,
    swap_tx: Option<String>,
}

impl<S> Orchestrator<S>
where
    S: OrderStore + Clone + Send + Sync + 'static,
{
    /// Consumes saga jobs for the lifetime of the orchestrator, spawning a
    /// detached task per job. Per-order serialization happens inside
    /// [`execute_saga`] via the order lock.
    ///
    /// [`execute_saga`]: Orchestrator::execute_saga
    pub(crate) async fn dispatch_sagas(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<SagaJob>) {
        while let Some(job) = rx.recv().await {
            let worker = Arc::clone(&self);
            tokio::spawn(async move { worker.execute_saga(job.order_id).await });
        }
    }

    /// Runs one saga execution to a terminal outcome.
    ///
    /// Never panics the task and never propagates: failures land in the
    /// order row and the event log. Store failures while recording an
    /// outcome are themselves recorded best-effort.
    pub(crate) async fn execute_saga(&self, order_id: OrderId) {
        let _guard = self.locks.acquire(&order_id).await;

        let order = match self.store.find_order(&order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::error!(%order_id, "saga queued for unknown order");
                return;
            }
            Err(e) => {
                tracing::error!(%order_id, error = %e, "failed to load order for saga");
                return;
            }
        };

        if !order.status.can_run_saga() {
            tracing::warn!(%order_id, status = %order.status, "saga skipped in current status");
            return;
        }

        if let Err(e) = self.run_registration_saga(&order).await {
            tracing::error!(%order_id, error = %e, "unhandled saga error");
            let _ = self
                .store
                .append_event(
                    &order_id,
                    event_kind::REGISTRATION_UNHANDLED_ERROR,
                    Some(json!({ "error": e.to_string() })),
                )
                .await;
        }
    }

    /// Drives swap (when needed) and registration, recording every
    /// transition. Returns `Err` only for store failures while persisting
    /// the outcome; saga-step failures are recorded, not returned.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, chain = %order.chain))]
    async fn run_registration_saga(&self, order: &Order) -> Result<()> {
        let started = Instant::now();
        metrics::counter!("registration_sagas").increment(1);

        let (progress, progress_rx) = Progress::channel();
        let forwarder = tokio::spawn(forward_progress(
            self.store.clone(),
            order.id.clone(),
            progress_rx,
        ));

        let outcome = self.saga_steps(order, &progress).await;
        drop(progress);
        let _ = forwarder.await;

        match outcome {
            Ok(success) => {
                let mut update = OrderUpdate::status(OrderStatus::Registered)
                    .registration_tx(success.registration_tx.clone())
                    .clear_registration_error()
                    .registered_at(Utc::now());
                if let Some(tx) = &success.swap_tx {
                    update = update.swap_tx(tx.clone());
                }
                self.store.apply(&order.id, update).await?;
                self.store
                    .append_event(
                        &order.id,
                        OrderStatus::Registered.as_str(),
                        Some(json!({
                            "chain": order.chain,
                            "txHash": success.registration_tx,
                            "swapTxHash": success.swap_tx,
                        })),
                    )
                    .await?;

                metrics::counter!("registration_sagas_completed").increment(1);
                metrics::histogram!("registration_saga_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(tx_hash = %success.registration_tx, "name registered");
            }
            Err(e) => {
                let message = e.to_string();
                self.store
                    .apply(
                        &order.id,
                        OrderUpdate::status(OrderStatus::RegistrationFailed)
                            .registration_error(message.clone()),
                    )
                    .await?;
                self.store
                    .append_event(
                        &order.id,
                        OrderStatus::RegistrationFailed.as_str(),
                        Some(json!({ "error": message })),
                    )
                    .await?;

                metrics::counter!("registration_sagas_failed").increment(1);
                metrics::histogram!("registration_saga_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::warn!(error = %message, "registration saga failed");
            }
        }

        Ok(())
    }

    /// The saga body: swap then register. Any error is a saga failure.
    async fn saga_steps(&self, order: &Order, progress: &Progress) -> Result<SagaSuccess> {
        let mut swap_tx = order.swap_tx.clone();

        if !order.chain.is_settlement_native() {
            if swap_tx.is_none() {
                self.store
                    .apply(&order.id, OrderUpdate::status(OrderStatus::Swapping))
                    .await?;
                self.store
                    .append_event(
                        &order.id,
                        OrderStatus::Swapping.as_str(),
                        Some(json!({ "chain": order.chain })),
                    )
                    .await?;
                progress.report(format!("Swapping USDC to {} tokens...", order.chain));

                let balance = self.settlement.usdc_balance().await?;
                if balance.trim().is_empty() || balance.trim() == "0" {
                    return Err(OrchestratorError::EmptyBalance);
                }

                let destination = self.wallets.destination_for(order.chain);
                let outcome = self.swap.execute(order.chain, &balance, destination).await?;
                swap_tx = outcome.tx_hash;
                progress.report("Swap complete");
            } else {
                // A previous attempt already moved the funds; registering
                // again must not pay twice.
                progress.report("Swap already completed, skipping");
            }
        }

        let mut update = OrderUpdate::status(OrderStatus::Registering);
        if let Some(tx) = &swap_tx {
            update = update.swap_tx(tx.clone());
        }
        self.store.apply(&order.id, update).await?;
        self.store
            .append_event(
                &order.id,
                OrderStatus::Registering.as_str(),
                Some(json!({ "chain": order.chain })),
            )
            .await?;

        let driver = self.drivers.for_chain(order.chain);
        let registration = driver
            .register(order.label(), &order.owner_address, progress)
            .await?;

        Ok(SagaSuccess {
            registration_tx: registration.tx_hash,
            swap_tx,
        })
    }
}

/// Forwards driver phase strings into the event log as `PROGRESS` events.
async fn forward_progress<S: OrderStore>(
    store: S,
    order_id: OrderId,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(step) = rx.recv().await {
        if let Err(e) = store
            .append_event(&order_id, event_kind::PROGRESS, Some(json!({ "step": step })))
            .await
        {
            tracing::warn!(%order_id, error = %e, "failed to record progress event");
        }
    }
}
