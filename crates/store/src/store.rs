use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Order, OrderEvent, OrderStatus};

use crate::Result;

/// A three-way patch for a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the current value untouched.
    #[default]
    Keep,
    /// Overwrite with a new value.
    Set(T),
    /// Reset to null.
    Clear,
}

impl<T> Patch<T> {
    /// Applies the patch to an optional slot.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *slot = Some(value),
            Patch::Clear => *slot = None,
        }
    }
}

/// An atomic update to an order's mutable projection.
///
/// Built with the fluent constructors below; fields left at their defaults
/// keep the stored value. Applying any update stamps `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_id: Patch<String>,
    pub registration_tx: Patch<String>,
    pub swap_tx: Patch<String>,
    pub registration_error: Patch<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub registered_at: Option<DateTime<Utc>>,
}

impl OrderUpdate {
    /// Starts an update that transitions to `status`.
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn payment_id(mut self, id: impl Into<String>) -> Self {
        self.payment_id = Patch::Set(id.into());
        self
    }

    pub fn registration_tx(mut self, tx: impl Into<String>) -> Self {
        self.registration_tx = Patch::Set(tx.into());
        self
    }

    pub fn swap_tx(mut self, tx: impl Into<String>) -> Self {
        self.swap_tx = Patch::Set(tx.into());
        self
    }

    pub fn registration_error(mut self, message: impl Into<String>) -> Self {
        self.registration_error = Patch::Set(message.into());
        self
    }

    pub fn clear_registration_error(mut self) -> Self {
        self.registration_error = Patch::Clear;
        self
    }

    pub fn paid_at(mut self, at: DateTime<Utc>) -> Self {
        self.paid_at = Some(at);
        self
    }

    pub fn registered_at(mut self, at: DateTime<Utc>) -> Self {
        self.registered_at = Some(at);
        self
    }

    /// Applies this update to an order in place, stamping `updated_at`.
    pub fn apply_to(self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        self.payment_id.apply_to(&mut order.payment_id);
        self.registration_tx.apply_to(&mut order.registration_tx);
        self.swap_tx.apply_to(&mut order.swap_tx);
        self.registration_error
            .apply_to(&mut order.registration_error);
        if let Some(at) = self.paid_at {
            order.paid_at = Some(at);
        }
        if let Some(at) = self.registered_at {
            order.registered_at = Some(at);
        }
        order.updated_at = Utc::now();
    }
}

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync); handles are cheap
/// to clone. Orders are never deleted and events are never rewritten.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a newly created order. Fails if the ID already exists.
    async fn insert_order(&self, order: Order) -> Result<()>;

    /// Retrieves an order by ID.
    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Retrieves an order by its payment session ID or payment ID.
    ///
    /// Webhook notifications carry either reference depending on the event
    /// kind, so both columns are matched.
    async fn find_by_payment_ref(&self, reference: &str) -> Result<Option<Order>>;

    /// Applies an update to the order's projection, returning the new row.
    async fn apply(&self, id: &OrderId, update: OrderUpdate) -> Result<Order>;

    /// Appends one event to the order's log.
    async fn append_event(
        &self,
        id: &OrderId,
        kind: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<()>;

    /// Retrieves all events for an order in append order.
    async fn events_for_order(&self, id: &OrderId) -> Result<Vec<OrderEvent>>;
}
