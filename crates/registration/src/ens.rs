//! ENS registration on Ethereum (commit–reveal).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::Registration;
use crate::error::RegistrationError;
use crate::progress::Progress;
use crate::{REGISTRATION_TERM_SECS, buffered_price};

/// ETHRegistrarController on mainnet.
pub const CONTROLLER: &str = "0x253553366Da8546fC250F225fe3d25d0C782303b";

/// Public resolver installed for newly registered names.
pub const PUBLIC_RESOLVER: &str = "0x231b0Ee14048e9dCcD1d247744d114a4EB5E8E63";

/// The protocol minimum is 60s; the margin absorbs clock drift between nodes.
pub const COMMITMENT_DELAY: Duration = Duration::from_secs(65);

/// Calls against the ENS registrar controller. Implementations confirm
/// write transactions before returning.
#[async_trait]
pub trait EnsController: Send + Sync {
    /// Current rent in wei for registering `label` for `duration_secs`.
    async fn rent_price(&self, label: &str, duration_secs: u64) -> Result<u128, RegistrationError>;

    /// Commitment hash binding label, owner, duration and secret.
    async fn make_commitment(
        &self,
        label: &str,
        owner: &str,
        duration_secs: u64,
        secret: [u8; 32],
    ) -> Result<[u8; 32], RegistrationError>;

    /// Submits the commitment on-chain.
    async fn commit(&self, commitment: [u8; 32]) -> Result<String, RegistrationError>;

    /// Submits the reveal, paying `value_wei`, installing `resolver`.
    async fn register(
        &self,
        label: &str,
        owner: &str,
        duration_secs: u64,
        secret: [u8; 32],
        resolver: &str,
        value_wei: u128,
    ) -> Result<String, RegistrationError>;
}

/// Registers `.eth` names through the two-phase commit–reveal protocol.
pub struct EnsDriver {
    controller: Arc<dyn EnsController>,
    commitment_delay: Duration,
}

impl EnsDriver {
    pub fn new(controller: Arc<dyn EnsController>) -> Self {
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
        let commitment = self
            .controller
            .make_commitment(label, owner, REGISTRATION_TERM_SECS, secret)
            .await?;

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
            .register(
                label,
                owner,
                REGISTRATION_TERM_SECS,
                secret,
                PUBLIC_RESOLVER,
                value,
            )
            .await?;

        Ok(Registration { tx_hash })
    }
}

// -- In-memory controller --

#[derive(Debug, Default)]
struct InMemoryEnsState {
    rent_wei: u128,
    commits: Vec<[u8; 32]>,
    registrations: Vec<(String, [u8; 32], u128)>,
    fail_on_commit: bool,
    fail_on_register: bool,
}

/// In-memory ENS controller for testing.
#[derive(Debug, Clone)]
pub struct InMemoryEnsController {
    state: Arc<Mutex<InMemoryEnsState>>,
}

impl InMemoryEnsController {
    /// Creates a controller quoting `rent_wei` for any label.
    pub fn with_rent(rent_wei: u128) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryEnsState {
                rent_wei,
                ..InMemoryEnsState::default()
            })),
        }
    }

    pub fn new() -> Self {
        Self::with_rent(1_000)
    }

    pub fn set_fail_on_commit(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_commit = fail;
    }

    pub fn set_fail_on_register(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_register = fail;
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commits.len()
    }

    /// Recorded (label, secret, value) register calls.
    pub fn registrations(&self) -> Vec<(String, [u8; 32], u128)> {
        self.state.lock().unwrap().registrations.clone()
    }
}

impl Default for InMemoryEnsController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnsController for InMemoryEnsController {
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
        duration_secs: u64,
        secret: [u8; 32],
    ) -> Result<[u8; 32], RegistrationError> {
        // Deterministic stand-in for the on-chain hash.
        let mut commitment = secret;
        for (i, byte) in label
            .bytes()
            .chain(owner.bytes())
            .chain(duration_secs.to_be_bytes())
            .enumerate()
        {
            commitment[i % 32] ^= byte;
        }
        Ok(commitment)
    }

    async fn commit(&self, commitment: [u8; 32]) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_commit {
            return Err(RegistrationError::Commit("commit reverted".to_string()));
        }
        state.commits.push(commitment);
        Ok(format!("0xens-commit-{:04}", state.commits.len()))
    }

    async fn register(
        &self,
        label: &str,
        _owner: &str,
        _duration_secs: u64,
        secret: [u8; 32],
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
        state
            .registrations
            .push((label.to_string(), secret, value_wei));
        Ok(format!("0xens-register-{:04}", state.registrations.len()))
    }
}
