//! Swap error types.

use domain::Chain;
use thiserror::Error;

/// Errors that can occur while executing a cross-chain swap.
#[derive(Debug, Error)]
pub enum SwapError {
    /// The chain settles in the platform asset; nothing to swap.
    #[error("swap not supported for {0}: chain settles in the platform asset")]
    SettlementNative(Chain),

    /// The bridge quote response carried no deposit address.
    #[error("no deposit address in bridge quote")]
    MissingDepositAddress,

    /// The settlement-chain transfer to the deposit address failed.
    #[error("settlement transfer failed: {0}")]
    Transfer(String),

    /// The bridge refunded the deposit instead of settling.
    #[error("swap was refunded by the bridge")]
    Refunded,

    /// The bridge quote expired before the deposit was processed.
    #[error("swap expired before settlement")]
    Expired,

    /// The bridge never reached a terminal status inside the wall-clock ceiling.
    #[error("swap timed out after {0}s")]
    TimedOut(u64),

    /// The bridge rejected a request.
    #[error("bridge api error: {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure.
    #[error("bridge request failed: {0}")]
    Http(#[from] reqwest::Error),
}
