//! The order orchestrator.
//!
//! Owns the order state machine and drives the registration saga: a
//! long-running, multi-step sequence that reconciles two independent payment
//! signals, executes an irreversible cross-chain swap where needed, and runs
//! the chain-specific registration protocol, persisting every transition so
//! the saga can resume after failures.

pub mod error;
pub mod events;
pub mod locks;
pub mod orchestrator;
mod saga;

pub use error::{OrchestratorError, Result};
pub use events::{ConfirmationSource, event_kind};
pub use locks::OrderLocks;
pub use orchestrator::{CreateOrderRequest, CreatedOrder, Orchestrator};
