//! Registration error types.

use thiserror::Error;

/// Errors raised by registration drivers and their chain clients.
///
/// Underlying messages are preserved verbatim: they end up in the order's
/// `registration_error` field for operators and buyers.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// On-chain price lookup failed.
    #[error("price lookup failed: {0}")]
    Price(String),

    /// Submitting or confirming the commitment failed.
    #[error("commitment failed: {0}")]
    Commit(String),

    /// The final registration call failed.
    #[error("registration failed: {0}")]
    Submit(String),

    /// The chain reported the name as already registered. Resubmitting the
    /// same call cannot succeed.
    #[error("{0} already exists")]
    NameTaken(String),

    /// No public key could be resolved for the buyer's account.
    #[error("could not resolve a public key for {0}")]
    OwnerKeyMissing(String),

    /// A chain API rejected a request.
    #[error("chain api error: {0}")]
    ChainApi(String),

    /// Transport-level failure.
    #[error("chain request failed: {0}")]
    Http(#[from] reqwest::Error),
}
