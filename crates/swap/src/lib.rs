//! Cross-chain swap execution.
//!
//! Converts the platform's settlement asset (USDC on NEAR) into the target
//! chain's asset through an external bridge. The bridge settles
//! asynchronously, so correctness rests entirely on polling its status to a
//! terminal state rather than trusting the initiating transfer.

pub mod bridge;
pub mod error;
pub mod executor;
pub mod settlement;

pub use bridge::{BridgeApi, BridgeStatus, InMemoryBridge, OneClickClient, Quote, SwapUpdate};
pub use error::SwapError;
pub use executor::{SwapExecutor, SwapOutcome};
pub use settlement::{InMemorySettlementWallet, PlatformWallets, SettlementWallet};
