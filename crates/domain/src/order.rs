//! The order projection and its append-only event log records.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::{Chain, Money, OrderStatus};

/// One name purchase attempt.
///
/// The identity and monetary fields are write-once at creation; everything
/// else is mutated exclusively by the orchestrator through status
/// transitions. Orders are never deleted; terminal states are retained for
/// audit and support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Opaque, collision-resistant identifier.
    pub id: OrderId,
    /// Full name being purchased, e.g. `pulse.eth`.
    pub name: String,
    /// The name suffix, e.g. `.eth`.
    pub tld: String,
    /// Target chain.
    pub chain: Chain,
    /// Registration term in years.
    pub years: u32,
    /// Quoted price at order creation.
    pub price: Money,
    /// Buyer-supplied destination wallet address.
    pub owner_address: String,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Checkout session at the payment processor.
    pub payment_session_id: Option<String>,
    /// Payment reference once the processor confirms.
    pub payment_id: Option<String>,
    /// On-chain registration transaction hash.
    pub registration_tx: Option<String>,
    /// Destination-chain transaction hash of the funding swap.
    pub swap_tx: Option<String>,
    /// Last registration error, cleared on success.
    pub registration_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub registered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a new order in `PENDING_PAYMENT` with a fresh ID.
    ///
    /// The ID exists before any checkout session does, so the session's
    /// metadata can reference it; attach the session with [`with_session`].
    ///
    /// [`with_session`]: Order::with_session
    pub fn new(
        name: impl Into<String>,
        chain: Chain,
        price: Money,
        owner_address: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            name: name.into(),
            tld: chain.tld().to_string(),
            chain,
            years: 1,
            price,
            owner_address: owner_address.into(),
            status: OrderStatus::PendingPayment,
            payment_session_id: None,
            payment_id: None,
            registration_tx: None,
            swap_tx: None,
            registration_error: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
            registered_at: None,
        }
    }

    /// Attaches the checkout session created for this order.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.payment_session_id = Some(session_id.into());
        self
    }

    /// The label portion of the name (everything before the suffix).
    pub fn label(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

/// One entry in an order's append-only event log.
///
/// Events are never updated or deleted; every status transition of the
/// order is paired with an event carrying the same tag, making the log a
/// replayable audit trail independent of the mutable projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Store-assigned sequence number.
    pub id: i64,
    pub order_id: OrderId,
    /// Free-form tag, e.g. `PAYMENT_CONFIRMED` or `PROGRESS`.
    pub kind: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// An order together with its full event log.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithEvents {
    pub order: Order,
    pub events: Vec<OrderEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order() -> Order {
        Order::new(
            "pulse.eth",
            Chain::Ethereum,
            Money::from_cents(900),
            "0x253553366Da8546fC250F225fe3d25d0C782303b",
        )
        .with_session("cs-test")
    }

    #[test]
    fn test_new_order_starts_pending() {
        let order = test_order();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.tld, ".eth");
        assert_eq!(order.years, 1);
        assert_eq!(order.payment_session_id.as_deref(), Some("cs-test"));
        assert!(order.payment_id.is_none());
        assert!(order.registration_tx.is_none());
        assert!(order.paid_at.is_none());
    }

    #[test]
    fn test_label_strips_suffix() {
        assert_eq!(test_order().label(), "pulse");

        let base = Order::new(
            "pulse.base.eth",
            Chain::Base,
            Money::from_cents(110),
            "0x253553366Da8546fC250F225fe3d25d0C782303b",
        );
        assert_eq!(base.label(), "pulse");
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = test_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
