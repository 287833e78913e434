//! Payment error types.

use thiserror::Error;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor rejected a request.
    #[error("payment api error: {status}: {body}")]
    Api { status: u16, body: String },

    /// The processor returned a body the client could not interpret.
    #[error("malformed payment api response: {0}")]
    Malformed(String),

    /// Transport-level failure.
    #[error("payment api request failed: {0}")]
    Http(#[from] reqwest::Error),
}
