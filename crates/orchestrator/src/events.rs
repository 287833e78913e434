//! Event tags recorded beyond the status-paired transitions.

use serde::Serialize;

/// Source of a payment confirmation signal.
///
/// Two producers can confirm the same order: the processor's webhook push
/// and the background polling pull. Events record which one won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationSource {
    Webhook,
    Polling,
}

impl ConfirmationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationSource::Webhook => "webhook",
            ConfirmationSource::Polling => "polling",
        }
    }
}

impl std::fmt::Display for ConfirmationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event kinds that are not paired with a status transition.
pub mod event_kind {
    /// Driver phase string forwarded into the log.
    pub const PROGRESS: &str = "PROGRESS";
    /// A retry was accepted for a failed registration.
    pub const RETRY_REQUESTED: &str = "RETRY_REQUESTED";
    /// An authenticated webhook reached a matching order.
    pub const WEBHOOK_RECEIVED: &str = "WEBHOOK_RECEIVED";
    /// A webhook arrived but the processor did not confirm the session.
    pub const PAYMENT_UNVERIFIED: &str = "PAYMENT_UNVERIFIED";
    /// The saga task failed outside the recorded failure path.
    pub const REGISTRATION_UNHANDLED_ERROR: &str = "REGISTRATION_UNHANDLED_ERROR";
}
