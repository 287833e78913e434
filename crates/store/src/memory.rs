use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderId;
use domain::{Order, OrderEvent};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrderStore, OrderUpdate},
};

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    events: Vec<OrderEvent>,
    next_event_id: i64,
}

/// In-memory order store for testing and development.
///
/// Provides the same interface as the PostgreSQL implementation. Clones
/// share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the total number of stored events.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.len()
    }

    /// Clears all orders and events.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.orders.clear();
        inner.events.clear();
        inner.next_event_id = 0;
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(order.id));
        }
        inner.orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(id).cloned())
    }

    async fn find_by_payment_ref(&self, reference: &str) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .find(|order| {
                order.payment_session_id.as_deref() == Some(reference)
                    || order.payment_id.as_deref() == Some(reference)
            })
            .cloned())
    }

    async fn apply(&self, id: &OrderId, update: OrderUpdate) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(id)
            .ok_or_else(|| StoreError::OrderNotFound(id.clone()))?;
        update.apply_to(order);
        Ok(order.clone())
    }

    async fn append_event(
        &self,
        id: &OrderId,
        kind: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.orders.contains_key(id) {
            return Err(StoreError::OrderNotFound(id.clone()));
        }
        inner.next_event_id += 1;
        let event = OrderEvent {
            id: inner.next_event_id,
            order_id: id.clone(),
            kind: kind.to_string(),
            payload,
            created_at: Utc::now(),
        };
        inner.events.push(event);
        Ok(())
    }

    async fn events_for_order(&self, id: &OrderId) -> Result<Vec<OrderEvent>> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .filter(|event| &event.order_id == id)
            .cloned()
            .collect())
    }
}
