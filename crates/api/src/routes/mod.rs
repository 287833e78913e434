//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod names;
pub mod orders;
pub mod webhooks;
