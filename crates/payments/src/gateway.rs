//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Money;

use crate::error::PaymentError;

/// Session status reported by the processor once payment settles.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// A newly created checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Processor-assigned session identifier.
    pub session_id: String,
    /// Hosted checkout page the buyer is redirected to.
    pub session_url: String,
}

/// Current state of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Raw processor status, e.g. `PENDING` or `COMPLETED`.
    pub status: String,
    /// Payment reference, present once the session completed.
    pub payment_id: Option<String>,
}

impl SessionStatus {
    /// True when the session reached the processor's terminal completed state.
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// Trait for payment processor operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session for `amount`, tagged with the order ID.
    async fn create_session(
        &self,
        amount: Money,
        order_id: &OrderId,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Fetches the current status of a session.
    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, PaymentError>;
}

#[derive(Debug, Default)]
struct SessionRecord {
    amount: Money,
    completed: bool,
    payment_id: Option<String>,
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    sessions: HashMap<String, SessionRecord>,
    next_id: u32,
    fail_on_create: bool,
    fail_on_status: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail session creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the gateway to fail status probes (simulates an outage).
    pub fn set_fail_on_status(&self, fail: bool) {
        self.state.write().unwrap().fail_on_status = fail;
    }

    /// Marks a session as completed with the given payment reference.
    pub fn complete_session(&self, session_id: &str, payment_id: &str) {
        let mut state = self.state.write().unwrap();
        if let Some(session) = state.sessions.get_mut(session_id) {
            session.completed = true;
            session.payment_id = Some(payment_id.to_string());
        }
    }

    /// Returns the number of sessions created.
    pub fn session_count(&self) -> usize {
        self.state.read().unwrap().sessions.len()
    }

    /// Returns the amount a session was created for.
    pub fn session_amount(&self, session_id: &str) -> Option<Money> {
        self.state
            .read()
            .unwrap()
            .sessions
            .get(session_id)
            .map(|s| s.amount)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_session(
        &self,
        amount: Money,
        _order_id: &OrderId,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(PaymentError::Api {
                status: 500,
                body: "session creation declined".to_string(),
            });
        }

        state.next_id += 1;
        let session_id = format!("cs-{:04}", state.next_id);
        state.sessions.insert(
            session_id.clone(),
            SessionRecord {
                amount,
                ..SessionRecord::default()
            },
        );

        Ok(CheckoutSession {
            session_url: format!("https://pay.test/checkout/{session_id}"),
            session_id,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, PaymentError> {
        let state = self.state.read().unwrap();

        if state.fail_on_status {
            return Err(PaymentError::Api {
                status: 503,
                body: "status endpoint unavailable".to_string(),
            });
        }

        let session = state.sessions.get(session_id).ok_or(PaymentError::Api {
            status: 404,
            body: format!("unknown session {session_id}"),
        })?;

        Ok(SessionStatus {
            status: if session.completed {
                STATUS_COMPLETED.to_string()
            } else {
                "PENDING".to_string()
            },
            payment_id: session.payment_id.clone(),
        })
    }
}
