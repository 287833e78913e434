//! `.arb` registration on Arbitrum (commit–reveal, short maturation).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::Registration;
use crate::error::RegistrationError;
use crate::progress::Progress;
use crate::{REGISTRATION_TERM_SECS, buffered_price};

/// Space ID registrar controller on Arbitrum One.
pub const CONTROLLER: &str = "0xb7da95ec908cba7587b2243ca45d5a2fa92ce618";

/// Resolver installed for newly registered names; the forward record points
/// at the owner.
pub const RESOLVER: &str = "0xd64b43a3C74100e6fD9E88c1E96ee01F6f41B5c0";

/// This registrar's maturation window is much shorter than ENS mainnet's.
pub const COMMITMENT_DELAY: Duration = Duration::from_secs(15);

/// Calls against the Arbitrum registrar controller. The commitment here
/// binds only label, owner and secret, with no duration. Implementations
/// confirm write transactions before returning.
#[async_trait]
pub trait ArbController: Send + Sync {
    /// Current rent in wei for registering `label` for `duration_secs`.
    async fn rent_price(&self, label: &str, duration_secs: u64) -> Result<u128, RegistrationError>;

    /// Commitment hash binding label, owner and secret.
    async fn make_commitment(
        &self,
        label: &str,
        owner: &str,
        secret: [u8; 32],
    ) -> Result<[u8; 32], RegistrationError>;

    /// Submits the commitment on-chain.
    async fn commit(&self, commitment: [u8; 32]) -> Result<String, RegistrationError>;

    /// Submits `registerWithConfig`, paying `value_wei`.
    async fn register_with_config(
        &self,
        label: &str,
        owner: &str,
        duration_secs: u64,
        secret: [u8; 32],
        resolver: &str,
        value_wei: u128,
    ) -> Result<String, RegistrationError>;
}

/// Registers `.arb` names through commit–reveal.
pub struct ArbDriver {
    controller: Arc<dyn ArbController>,
    commitment_delay: Duration,
}

impl ArbDriver {
    pub fn new(controller: Arc<dyn ArbController>) -> Self {
        Self {
            controller,
            commitment_delay: COMMITMENT_DELAY,
        }
    }

    /// Overrides the maturation delay (tests).
    pub fn with_commitment_delay(mut self, delay: Duration) -> Self {
        self.commitment_delay = delay;
        self
    }

    #[tracing::instrument(skip(self, progress))]
    pub async fn register(
        &self,
        label: &str,
        owner: &str,
        progress: &Progress,
    ) -> Result<Registration, RegistrationError> {
        let secret: [u8; 32] = rand::random();

        progress.report("Calculating commitment...");
        let commitment = self.controller.make_commitment(label, owner, secret).await?;

        progress.report("Submitting commitment...");
        self.controller.commit(commitment).await?;

        progress.report(format!(
            "Waiting {}s for commitment to mature...",
            self.commitment_delay.as_secs()
        ));
        tokio::time::sleep(self.commitment_delay).await;

        let rent = self
            .controller
            .rent_price(label, REGISTRATION_TERM_SECS)
            .await?;
        let value = buffered_price(rent);

        progress.report("Registering name on-chain...");
        let tx_hash = self
            .controller
            .register_with_config(label, owner, REGISTRATION_TERM_SECS, secret, RESOLVER, value)
            .await?;

        Ok(Registration { tx_hash })
    }
}

// -- In-memory controller --

#[derive(Debug, Default)]
struct InMemoryArbState {
    rent_wei: u128,
    commits: Vec<[u8; 32]>,
    registrations: Vec<(String, u128)>,
    fail_on_register: bool,
}

/// In-memory Arbitrum controller for testing.
#[derive(Debug, Clone)]
pub struct InMemoryArbController {
    state: Arc<Mutex<InMemoryArbState>>,
}

impl InMemoryArbController {
    pub fn with_rent(rent_wei: u128) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryArbState {
                rent_wei,
                ..InMemoryArbState::default()
            })),
        }
    }

    pub fn new() -> Self {
        Self::with_rent(1_000)
    }

    pub fn set_fail_on_register(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_register = fail;
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commits.len()
    }

    pub fn registrations(&self) -> Vec<(String, u128)> {
        self.state.lock().unwrap().registrations.clone()
    }
}

impl Default for InMemoryArbController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArbController for InMemoryArbController {
    async fn rent_price(
        &self,
        _label: &str,
        _duration_secs: u64,
    ) -> Result<u128, RegistrationError> {
        Ok(self.state.lock().unwrap().rent_wei)
    }

    async fn make_commitment(
        &self,
        label: &str,
        owner: &str,
        secret: [u8; 32],
    ) -> Result<[u8; 32], RegistrationError> {
        let mut commitment = secret;
        for (i, byte) in label.bytes().chain(owner.bytes()).enumerate() {
            commitment[i % 32] ^= byte;
        }
        Ok(commitment)
    }

    async fn commit(&self, commitment: [u8; 32]) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        state.commits.push(commitment);
        Ok(format!("0xarb-commit-{:04}", state.commits.len()))
    }

    async fn register_with_config(
        &self,
        label: &str,
        _owner: &str,
        _duration_secs: u64,
        _secret: [u8; 32],
        _resolver: &str,
        value_wei: u128,
    ) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_register {
            return Err(RegistrationError::Submit("register reverted".to_string()));
        }
        if state.commits.is_empty() {
            return Err(RegistrationError::Submit(
                "no commitment on record".to_string(),
            ));
        }
        state.registrations.push((label.to_string(), value_wei));
        Ok(format!("0xarb-register-{:04}", state.registrations.len()))
    }
}
