//! Settlement wallet contract and platform address book.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::Chain;

use crate::error::SwapError;

/// Operations against the platform's custody account on the settlement
/// chain. Signing is injected; the platform only sees this interface.
#[async_trait]
pub trait SettlementWallet: Send + Sync {
    /// Current USDC balance in minor units, as a decimal string.
    async fn usdc_balance(&self) -> Result<String, SwapError>;

    /// Sends `amount` USDC minor units to `receiver`.
    ///
    /// Covers both halves of the transfer: registering the receiver with the
    /// token contract's storage, then the transfer itself. Either both
    /// succeed or the transfer is abandoned.
    async fn transfer_usdc(&self, receiver: &str, amount: &str) -> Result<String, SwapError>;

    /// The custody account ID, used as the bridge refund address.
    fn account_id(&self) -> String;
}

/// Addresses the platform custodies on each destination chain.
///
/// Swapped funds land here before the registration call spends them.
#[derive(Debug, Clone)]
pub struct PlatformWallets {
    pub evm_address: String,
    pub solana_address: String,
    pub near_account_id: String,
}

impl PlatformWallets {
    /// Resolves the platform's receiving address on a chain.
    pub fn destination_for(&self, chain: Chain) -> &str {
        match chain {
            Chain::Ethereum | Chain::Base | Chain::Arbitrum => &self.evm_address,
            Chain::Solana => &self.solana_address,
            Chain::Near => &self.near_account_id,
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryWalletState {
    balance: String,
    transfers: Vec<(String, String)>,
    fail_on_transfer: bool,
}

/// In-memory settlement wallet for testing.
#[derive(Debug, Clone)]
pub struct InMemorySettlementWallet {
    state: Arc<Mutex<InMemoryWalletState>>,
}

impl InMemorySettlementWallet {
    /// Creates a wallet with a zero balance.
    pub fn new() -> Self {
        Self::with_balance("0")
    }

    /// Creates a wallet holding `balance` USDC minor units.
    pub fn with_balance(balance: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryWalletState {
                balance: balance.into(),
                ..InMemoryWalletState::default()
            })),
        }
    }

    pub fn set_balance(&self, balance: impl Into<String>) {
        self.state.lock().unwrap().balance = balance.into();
    }

    pub fn set_fail_on_transfer(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_transfer = fail;
    }

    /// Returns the number of transfers made.
    pub fn transfer_count(&self) -> usize {
        self.state.lock().unwrap().transfers.len()
    }

    /// Returns the recorded (receiver, amount) transfers.
    pub fn transfers(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().transfers.clone()
    }
}

impl Default for InMemorySettlementWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementWallet for InMemorySettlementWallet {
    async fn usdc_balance(&self) -> Result<String, SwapError> {
        Ok(self.state.lock().unwrap().balance.clone())
    }

    async fn transfer_usdc(&self, receiver: &str, amount: &str) -> Result<String, SwapError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_transfer {
            return Err(SwapError::Transfer("transfer rejected".to_string()));
        }
        state
            .transfers
            .push((receiver.to_string(), amount.to_string()));
        Ok(format!("near-tx-{:04}", state.transfers.len()))
    }

    fn account_id(&self) -> String {
        "platform.near".to_string()
    }
}
