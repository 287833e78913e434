//! Payment processor integration.
//!
//! Two independent trigger paths (an authenticated webhook push and a
//! throttled polling pull) converge on one reconciler contract: a checkout
//! session either verifiably completed or it did not, and "did not" is never
//! an error.

pub mod error;
pub mod gateway;
pub mod pingpay;
pub mod reconciler;
pub mod webhook;

pub use error::PaymentError;
pub use gateway::{CheckoutSession, InMemoryPaymentGateway, PaymentGateway, SessionStatus};
pub use pingpay::PingPayClient;
pub use reconciler::{PaymentReconciler, Verification};
pub use webhook::{
    SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookEvent, WebhookKind, sign, verify_signature,
};
