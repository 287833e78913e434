//! `.base.eth` registration on Base (direct, no commit phase).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::driver::Registration;
use crate::error::RegistrationError;
use crate::progress::Progress;
use crate::{REGISTRATION_TERM_SECS, buffered_price};

/// Basenames registrar controller on Base mainnet.
pub const CONTROLLER: &str = "0xa7d2607c6BD39Ae9521e514026CBB078405Ab322";

/// L2 resolver installed for newly registered names.
pub const BASE_RESOLVER: &str = "0x426fA03fB86E510d0Dd9F70335Cf102a98b10875";

/// Calls against the Basenames registrar controller. Implementations
/// confirm the write before returning.
#[async_trait]
pub trait BasenameController: Send + Sync {
    /// Current register price in wei for `label` over `duration_secs`.
    async fn register_price(
        &self,
        label: &str,
        duration_secs: u64,
    ) -> Result<u128, RegistrationError>;

    /// Submits the registration request struct, paying `value_wei`,
    /// installing `resolver`, no reverse record.
    async fn register(
        &self,
        label: &str,
        owner: &str,
        duration_secs: u64,
        resolver: &str,
        value_wei: u128,
    ) -> Result<String, RegistrationError>;
}

/// Registers `.base.eth` names with a single priced call.
pub struct BaseDriver {
    controller: Arc<dyn BasenameController>,
}

impl BaseDriver {
    pub fn new(controller: Arc<dyn BasenameController>) -> Self {
        Self { controller }
    }

    #[tracing::instrument(skip(self, progress))]
    pub async fn register(
        &self,
        label: &str,
        owner: &str,
        progress: &Progress,
    ) -> Result<Registration, RegistrationError> {
        progress.report("Fetching registration price...");
        let price = self
            .controller
            .register_price(label, REGISTRATION_TERM_SECS)
            .await?;
        let value = buffered_price(price);

        progress.report("Registering name on Base...");
        let tx_hash = self
            .controller
            .register(label, owner, REGISTRATION_TERM_SECS, BASE_RESOLVER, value)
            .await?;

        Ok(Registration { tx_hash })
    }
}

// -- In-memory controller --

#[derive(Debug, Default)]
struct InMemoryBaseState {
    price_wei: u128,
    registrations: Vec<(String, u128)>,
    fail_on_price: bool,
    fail_on_register: bool,
}

/// In-memory Basenames controller for testing.
#[derive(Debug, Clone)]
pub struct InMemoryBasenameController {
    state: Arc<Mutex<InMemoryBaseState>>,
}

impl InMemoryBasenameController {
    pub fn with_price(price_wei: u128) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryBaseState {
                price_wei,
                ..InMemoryBaseState::default()
            })),
        }
    }

    pub fn new() -> Self {
        Self::with_price(1_000)
    }

    pub fn set_fail_on_price(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_price = fail;
    }

    pub fn set_fail_on_register(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_register = fail;
    }

    pub fn registrations(&self) -> Vec<(String, u128)> {
        self.state.lock().unwrap().registrations.clone()
    }
}

impl Default for InMemoryBasenameController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasenameController for InMemoryBasenameController {
    async fn register_price(
        &self,
        _label: &str,
        _duration_secs: u64,
    ) -> Result<u128, RegistrationError> {
        let state = self.state.lock().unwrap();
        if state.fail_on_price {
            return Err(RegistrationError::Price("price call reverted".to_string()));
        }
        Ok(state.price_wei)
    }

    async fn register(
        &self,
        label: &str,
        _owner: &str,
        _duration_secs: u64,
        _resolver: &str,
        value_wei: u128,
    ) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_register {
            return Err(RegistrationError::Submit("register reverted".to_string()));
        }
        state.registrations.push((label.to_string(), value_wei));
        Ok(format!("0xbase-register-{:04}", state.registrations.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_call_with_buffered_price() {
        let controller = InMemoryBasenameController::with_price(500);
        let driver = BaseDriver::new(Arc::new(controller.clone()));

        let registration = driver
            .register("pulse", "0xowner", &Progress::disabled())
            .await
            .unwrap();
        assert!(registration.tx_hash.starts_with("0xbase-register"));
        assert_eq!(controller.registrations(), vec![("pulse".to_string(), 550)]);
    }

    #[tokio::test]
    async fn test_price_failure_stops_before_register() {
        let controller = InMemoryBasenameController::new();
        controller.set_fail_on_price(true);
        let driver = BaseDriver::new(Arc::new(controller.clone()));

        let err = driver
            .register("pulse", "0xowner", &Progress::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Price(_)));
        assert!(controller.registrations().is_empty());
    }

    #[tokio::test]
    async fn test_register_failure_propagates() {
        let controller = InMemoryBasenameController::new();
        controller.set_fail_on_register(true);
        let driver = BaseDriver::new(Arc::new(controller.clone()));

        let err = driver
            .register("pulse", "0xowner", &Progress::disabled())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("register reverted"));
    }
}
