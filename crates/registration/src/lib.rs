//! Per-chain name registration drivers.
//!
//! Five drivers share one contract: register a label for an owner, calling
//! back with human-readable phase strings. Two chains (Ethereum, Arbitrum)
//! run a commit–reveal protocol with a mandatory maturation delay; the rest
//! register directly. Chain transport and signing live behind per-chain
//! client traits; the drivers own only the protocol.

pub mod arbitrum;
pub mod availability;
pub mod base;
pub mod driver;
pub mod ens;
pub mod error;
pub mod near;
pub mod progress;
pub mod solana;

pub use arbitrum::{ArbController, ArbDriver, InMemoryArbController};
pub use availability::{AvailabilityChecker, FixedAvailability, NameCheck, check_names};
pub use base::{BaseDriver, BasenameController, InMemoryBasenameController};
pub use driver::{ChainDriver, DriverSet, Registration};
pub use ens::{EnsController, EnsDriver, InMemoryEnsController};
pub use error::RegistrationError;
pub use near::{FastNearRpc, InMemoryNearRpc, InMemoryNearWallet, NearDriver, NearRpc, NearWallet};
pub use progress::Progress;
pub use solana::{
    BonfidaGateway, InMemorySnsGateway, InMemorySolanaWallet, SnsDriver, SnsGateway, SolanaWallet,
};

/// Registration term where the protocol takes a duration: one year.
pub const REGISTRATION_TERM_SECS: u64 = 365 * 24 * 60 * 60;

/// Applies the +10% safety buffer to a quoted on-chain price, tolerating
/// drift between quote and execution.
pub fn buffered_price(price: u128) -> u128 {
    price * 110 / 100
}
