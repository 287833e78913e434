//! Payment reconciliation from webhook and polling sources.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::OrderId;
use dashmap::DashMap;
use domain::Order;

use crate::gateway::PaymentGateway;

/// Minimum spacing between processor probes for one order on the polling path.
pub const VERIFY_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of a verification probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub verified: bool,
    pub payment_id: Option<String>,
}

impl Verification {
    fn unverified() -> Self {
        Self {
            verified: false,
            payment_id: None,
        }
    }
}

/// Determines whether a checkout session actually completed.
///
/// Both trigger paths (webhook push and polling pull) normalize to the same
/// signal here. An unverified result means "try again later", never an
/// error; transport failures are folded into unverified.
pub struct PaymentReconciler {
    gateway: Arc<dyn PaymentGateway>,
    last_probe: DashMap<OrderId, Instant>,
    interval: Duration,
}

impl PaymentReconciler {
    /// Creates a reconciler with the default polling throttle.
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            last_probe: DashMap::new(),
            interval: VERIFY_INTERVAL,
        }
    }

    /// Overrides the polling throttle interval (tests).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Verifies a session against the processor.
    #[tracing::instrument(skip(self))]
    pub async fn verify(&self, session_id: &str) -> Verification {
        match self.gateway.session_status(session_id).await {
            Ok(status) if status.is_completed() => {
                metrics::counter!("payment_verifications_confirmed").increment(1);
                Verification {
                    verified: true,
                    payment_id: status.payment_id,
                }
            }
            Ok(_) => Verification::unverified(),
            Err(e) => {
                tracing::debug!(error = %e, "session status probe failed");
                Verification::unverified()
            }
        }
    }

    /// Throttled verification on the polling path.
    ///
    /// Probes at most once per interval per order, and only while the order
    /// is still awaiting payment with a session attached. Returns `None`
    /// when no probe was made. The throttle entry is dropped once the order
    /// verifies, ending its lifecycle with the pending window.
    pub async fn poll_verify(&self, order: &Order) -> Option<Verification> {
        if !order.status.can_confirm_payment() {
            return None;
        }
        let session_id = order.payment_session_id.as_deref()?;

        let due = match self.last_probe.get(&order.id) {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_probe.insert(order.id.clone(), Instant::now());

        let verification = self.verify(session_id).await;
        if verification.verified {
            self.last_probe.remove(&order.id);
        }
        Some(verification)
    }
}
