//! Domain error types.

use thiserror::Error;

use crate::Chain;

/// Errors raised while validating or decoding domain values.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Name is malformed or uses an unsupported suffix.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Owner address does not match the chain's address format.
    #[error("invalid owner address for {chain}")]
    InvalidOwnerAddress { chain: Chain },

    /// Name suffix does not belong to the requested chain.
    #[error("{name} does not belong to chain {chain}")]
    ChainMismatch { name: String, chain: Chain },

    /// Unrecognized chain identifier.
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    /// Unrecognized order status value.
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
}
