//! Orchestrator error types.

use common::OrderId;
use domain::{DomainError, OrderStatus};
use payments::PaymentError;
use registration::RegistrationError;
use store::StoreError;
use swap::SwapError;
use thiserror::Error;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Request validation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The name is no longer available at order-creation time.
    #[error("{0} is not available")]
    NameUnavailable(String),

    /// Order not found.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Retry was requested from a state other than `REGISTRATION_FAILED`.
    #[error("can only retry failed registrations (order is {status})")]
    RetryNotAllowed { status: OrderStatus },

    /// The settlement account holds no funds to swap.
    #[error("no USDC available in the settlement account")]
    EmptyBalance,

    /// Order store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payment processor error.
    #[error("payment processor error: {0}")]
    Payment(#[from] PaymentError),

    /// Swap execution error.
    #[error(transparent)]
    Swap(#[from] SwapError),

    /// Registration driver error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
