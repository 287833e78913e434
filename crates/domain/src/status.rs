//! Order status state machine.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// PendingPayment ──► PaymentConfirmed ──► [Swapping] ──► Registering ──► Registered
///       │                    │ (settlement-native          │
///       ▼                    │  chains skip the swap)      ▼
///    Expired                 └────────────────────► RegistrationFailed
///                                                          │
///                                           retry loops back to Swapping/Registering
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, waiting for the buyer to complete checkout.
    #[default]
    PendingPayment,

    /// Payment verified against the processor; saga queued.
    PaymentConfirmed,

    /// Bridging settlement funds to the target chain.
    Swapping,

    /// The chain driver is running the registration protocol.
    Registering,

    /// Name registered on-chain (terminal state).
    Registered,

    /// Swap or registration failed; recoverable via explicit retry.
    RegistrationFailed,

    /// Checkout session expired before payment (terminal state).
    Expired,
}

impl OrderStatus {
    /// Returns true if payment can be confirmed in this state.
    pub fn can_confirm_payment(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment)
    }

    /// Returns true if the order can expire in this state.
    pub fn can_expire(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment)
    }

    /// Returns true if the registration saga may run in this state.
    pub fn can_run_saga(&self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentConfirmed | OrderStatus::RegistrationFailed
        )
    }

    /// Returns true if a retry may be accepted in this state.
    pub fn can_retry(&self) -> bool {
        matches!(self, OrderStatus::RegistrationFailed)
    }

    /// Returns true once payment confirmation has been recorded, whatever
    /// has happened since.
    pub fn is_past_confirmation(&self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentConfirmed
                | OrderStatus::Swapping
                | OrderStatus::Registering
                | OrderStatus::Registered
                | OrderStatus::RegistrationFailed
        )
    }

    /// Returns true if this is a terminal state (no further transitions).
    ///
    /// `RegistrationFailed` is not terminal: a retry re-enters the saga.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Registered | OrderStatus::Expired)
    }

    /// Returns the status name as stored and logged.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::PaymentConfirmed => "PAYMENT_CONFIRMED",
            OrderStatus::Swapping => "SWAPPING",
            OrderStatus::Registering => "REGISTERING",
            OrderStatus::Registered => "REGISTERED",
            OrderStatus::RegistrationFailed => "REGISTRATION_FAILED",
            OrderStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(OrderStatus::PendingPayment),
            "PAYMENT_CONFIRMED" => Ok(OrderStatus::PaymentConfirmed),
            "SWAPPING" => Ok(OrderStatus::Swapping),
            "REGISTERING" => Ok(OrderStatus::Registering),
            "REGISTERED" => Ok(OrderStatus::Registered),
            "REGISTRATION_FAILED" => Ok(OrderStatus::RegistrationFailed),
            "EXPIRED" => Ok(OrderStatus::Expired),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ALL: [OrderStatus; 7] = [
        OrderStatus::PendingPayment,
        OrderStatus::PaymentConfirmed,
        OrderStatus::Swapping,
        OrderStatus::Registering,
        OrderStatus::Registered,
        OrderStatus::RegistrationFailed,
        OrderStatus::Expired,
    ];

    #[test]
    fn test_default_status_is_pending_payment() {
        assert_eq!(OrderStatus::default(), OrderStatus::PendingPayment);
    }

    #[test]
    fn test_only_pending_can_confirm_or_expire() {
        for status in ALL {
            let pending = status == OrderStatus::PendingPayment;
            assert_eq!(status.can_confirm_payment(), pending);
            assert_eq!(status.can_expire(), pending);
        }
    }

    #[test]
    fn test_only_failed_can_retry() {
        for status in ALL {
            assert_eq!(
                status.can_retry(),
                status == OrderStatus::RegistrationFailed
            );
        }
    }

    #[test]
    fn test_saga_runs_from_confirmed_or_failed() {
        assert!(OrderStatus::PaymentConfirmed.can_run_saga());
        assert!(OrderStatus::RegistrationFailed.can_run_saga());
        assert!(!OrderStatus::PendingPayment.can_run_saga());
        assert!(!OrderStatus::Registering.can_run_saga());
        assert!(!OrderStatus::Registered.can_run_saga());
        assert!(!OrderStatus::Expired.can_run_saga());
    }

    #[test]
    fn test_past_confirmation() {
        assert!(!OrderStatus::PendingPayment.is_past_confirmation());
        assert!(!OrderStatus::Expired.is_past_confirmation());
        assert!(OrderStatus::PaymentConfirmed.is_past_confirmation());
        assert!(OrderStatus::Swapping.is_past_confirmation());
        assert!(OrderStatus::Registering.is_past_confirmation());
        assert!(OrderStatus::Registered.is_past_confirmation());
        assert!(OrderStatus::RegistrationFailed.is_past_confirmation());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Registered.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(!OrderStatus::RegistrationFailed.is_terminal());
        assert!(!OrderStatus::PendingPayment.is_terminal());
    }

    #[test]
    fn test_str_roundtrip() {
        for status in ALL {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::from_str("PAYMENT_PROCESSING").is_err());
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingPayment).unwrap(),
            "\"PENDING_PAYMENT\""
        );
        let status: OrderStatus = serde_json::from_str("\"REGISTRATION_FAILED\"").unwrap();
        assert_eq!(status, OrderStatus::RegistrationFailed);
    }
}
