//! `.sol` registration through the Bonfida SNS gateway.
//!
//! The gateway builds the full registration transaction server-side; the
//! platform wallet only signs and submits it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::driver::Registration;
use crate::error::RegistrationError;
use crate::progress::Progress;

/// Production gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "https://sns-sdk-proxy.bonfida.workers.dev";

/// Account space allocated for the name record.
const NAME_SPACE_BYTES: u32 = 1000;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds serialized SNS registration transactions.
#[async_trait]
pub trait SnsGateway: Send + Sync {
    /// Returns a base64-serialized registration transaction for `label`,
    /// funded by `buyer`, allocating `space` bytes.
    async fn build_register_tx(
        &self,
        buyer: &str,
        label: &str,
        space: u32,
    ) -> Result<String, RegistrationError>;
}

/// The platform's Solana custody wallet.
#[async_trait]
pub trait SolanaWallet: Send + Sync {
    /// Public address of the custody keypair.
    fn address(&self) -> String;

    /// Signs a serialized transaction with a fresh blockhash, submits it and
    /// waits for confirmation.
    async fn sign_and_send(&self, tx_base64: &str) -> Result<String, RegistrationError>;
}

/// Registers `.sol` names via the gateway + custody wallet pair.
pub struct SnsDriver {
    gateway: Arc<dyn SnsGateway>,
    wallet: Arc<dyn SolanaWallet>,
}

impl SnsDriver {
    pub fn new(gateway: Arc<dyn SnsGateway>, wallet: Arc<dyn SolanaWallet>) -> Self {
        Self { gateway, wallet }
    }

    #[tracing::instrument(skip(self, progress))]
    pub async fn register(
        &self,
        label: &str,
        _owner: &str,
        progress: &Progress,
    ) -> Result<Registration, RegistrationError> {
        progress.report("Fetching registration transaction from Bonfida...");
        let tx = self
            .gateway
            .build_register_tx(&self.wallet.address(), label, NAME_SPACE_BYTES)
            .await?;

        progress.report("Signing and submitting transaction...");
        let tx_hash = self.wallet.sign_and_send(&tx).await?;

        progress.report("Solana name registered");
        Ok(Registration { tx_hash })
    }
}

// -- HTTP gateway --

#[derive(Debug, Deserialize)]
struct GatewayEnvelope {
    #[serde(default)]
    s: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// HTTP client for the Bonfida SNS proxy.
#[derive(Debug, Clone)]
pub struct BonfidaGateway {
    http: reqwest::Client,
    base_url: String,
}

impl BonfidaGateway {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }

    /// Overrides the gateway base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for BonfidaGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnsGateway for BonfidaGateway {
    #[tracing::instrument(skip(self))]
    async fn build_register_tx(
        &self,
        buyer: &str,
        label: &str,
        space: u32,
    ) -> Result<String, RegistrationError> {
        let response = self
            .http
            .get(format!("{}/register", self.base_url))
            .query(&[
                ("buyer", buyer),
                ("domain", label),
                ("space", &space.to_string()),
                ("serialize", "true"),
            ])
            .timeout(GATEWAY_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "no body".to_string());
            return Err(RegistrationError::ChainApi(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let envelope: GatewayEnvelope = response.json().await?;
        if envelope.s.as_deref() != Some("ok") {
            return Err(RegistrationError::Submit(format!(
                "gateway rejected registration: {:?}",
                envelope.result
            )));
        }
        match envelope.result {
            Some(serde_json::Value::String(tx)) => Ok(tx),
            other => Err(RegistrationError::ChainApi(format!(
                "unexpected gateway result: {other:?}"
            ))),
        }
    }
}

// -- In-memory fakes --

#[derive(Debug, Default)]
struct InMemorySnsState {
    requests: Vec<(String, String)>,
    fail: bool,
}

/// In-memory SNS gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnsGateway {
    state: Arc<Mutex<InMemorySnsState>>,
}

impl InMemorySnsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Recorded (buyer, label) requests.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl SnsGateway for InMemorySnsGateway {
    async fn build_register_tx(
        &self,
        buyer: &str,
        label: &str,
        _space: u32,
    ) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(RegistrationError::Submit(
                "gateway rejected registration".to_string(),
            ));
        }
        state.requests.push((buyer.to_string(), label.to_string()));
        Ok(format!("dHgtZm9yLX{label}"))
    }
}

#[derive(Debug, Default)]
struct InMemorySolanaState {
    submitted: Vec<String>,
    fail: bool,
}

/// In-memory Solana wallet for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySolanaWallet {
    state: Arc<Mutex<InMemorySolanaState>>,
}

impl InMemorySolanaWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn submitted_count(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }
}

#[async_trait]
impl SolanaWallet for InMemorySolanaWallet {
    fn address(&self) -> String {
        "7NsngNMtXJNdHgeK4znQDZ5PJ19ykVvQvEF7BT5KFjMv".to_string()
    }

    async fn sign_and_send(&self, tx_base64: &str) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(RegistrationError::Submit(
                "transaction simulation failed".to_string(),
            ));
        }
        state.submitted.push(tx_base64.to_string());
        Ok(format!("sol-sig-{:04}", state.submitted.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_tx_for_platform_wallet_then_submits() {
        let gateway = InMemorySnsGateway::new();
        let wallet = InMemorySolanaWallet::new();
        let driver = SnsDriver::new(Arc::new(gateway.clone()), Arc::new(wallet.clone()));

        let registration = driver
            .register("pulse", "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T", &Progress::disabled())
            .await
            .unwrap();

        assert_eq!(registration.tx_hash, "sol-sig-0001");
        // The gateway is asked to bill the custody wallet, not the buyer.
        assert_eq!(
            gateway.requests(),
            vec![(wallet.address(), "pulse".to_string())]
        );
    }

    #[tokio::test]
    async fn test_gateway_failure_stops_before_submit() {
        let gateway = InMemorySnsGateway::new();
        gateway.set_fail(true);
        let wallet = InMemorySolanaWallet::new();
        let driver = SnsDriver::new(Arc::new(gateway), Arc::new(wallet.clone()));

        let err = driver
            .register("pulse", "owner", &Progress::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Submit(_)));
        assert_eq!(wallet.submitted_count(), 0);
    }

    #[test]
    fn test_gateway_envelope_shapes() {
        let ok: GatewayEnvelope =
            serde_json::from_str(r#"{"s": "ok", "result": "dHg="}"#).unwrap();
        assert_eq!(ok.s.as_deref(), Some("ok"));

        let err: GatewayEnvelope =
            serde_json::from_str(r#"{"s": "error", "result": {"message": "taken"}}"#).unwrap();
        assert_ne!(err.s.as_deref(), Some("ok"));

        let empty: GatewayEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.s, None);
    }
}
