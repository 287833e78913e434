//! NEAR account creation through the `near` registrar.
//!
//! There is no name registry contract: owning `label.near` means the account
//! exists with the buyer's public key installed. The buyer's key is resolved
//! from their existing account before the create call.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::driver::Registration;
use crate::error::RegistrationError;
use crate::progress::Progress;

/// The top-level registrar account.
pub const REGISTRAR_ACCOUNT: &str = "near";

/// Production RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://rpc.mainnet.fastnear.com";

/// 0.1 NEAR, funds the new account's storage.
pub const STORAGE_DEPOSIT_YOCTO: u128 = 100_000_000_000_000_000_000_000;

const RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only NEAR RPC queries.
#[async_trait]
pub trait NearRpc: Send + Sync {
    /// First full-access public key registered on `account_id`, if any.
    async fn first_public_key(
        &self,
        account_id: &str,
    ) -> Result<Option<String>, RegistrationError>;
}

/// The platform's NEAR custody account.
#[async_trait]
pub trait NearWallet: Send + Sync {
    /// Custody account ID.
    fn account_id(&self) -> String;

    /// Calls `create_account` on the registrar with the given key and
    /// storage deposit, waits for the receipt, returns the tx hash.
    async fn create_account(
        &self,
        new_account_id: &str,
        public_key: &str,
        deposit_yocto: u128,
    ) -> Result<String, RegistrationError>;
}

/// Registers `label.near` by creating the account for the buyer.
pub struct NearDriver {
    rpc: Arc<dyn NearRpc>,
    wallet: Arc<dyn NearWallet>,
}

impl NearDriver {
    pub fn new(rpc: Arc<dyn NearRpc>, wallet: Arc<dyn NearWallet>) -> Self {
        Self { rpc, wallet }
    }

    #[tracing::instrument(skip(self, progress))]
    pub async fn register(
        &self,
        label: &str,
        owner_account: &str,
        progress: &Progress,
    ) -> Result<Registration, RegistrationError> {
        let new_account_id = format!("{label}.near");

        progress.report("Creating NEAR account...");
        let public_key = self
            .rpc
            .first_public_key(owner_account)
            .await?
            .ok_or_else(|| RegistrationError::OwnerKeyMissing(owner_account.to_string()))?;

        match self
            .wallet
            .create_account(&new_account_id, &public_key, STORAGE_DEPOSIT_YOCTO)
            .await
        {
            Ok(tx_hash) => Ok(Registration { tx_hash }),
            Err(e) => {
                let message = e.to_string();
                if message.contains("AccountAlreadyExists") || message.contains("already exists") {
                    Err(RegistrationError::NameTaken(new_account_id))
                } else {
                    Err(RegistrationError::Submit(message))
                }
            }
        }
    }
}

// -- HTTP RPC client --

#[derive(Debug, Deserialize)]
struct AccessKeyEntry {
    public_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct AccessKeyList {
    #[serde(default)]
    keys: Vec<AccessKeyEntry>,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<AccessKeyList>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// JSON-RPC client for NEAR view queries.
#[derive(Debug, Clone)]
pub struct FastNearRpc {
    http: reqwest::Client,
    rpc_url: String,
}

impl FastNearRpc {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
        }
    }

    /// Overrides the RPC endpoint (tests).
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }
}

impl Default for FastNearRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NearRpc for FastNearRpc {
    #[tracing::instrument(skip(self))]
    async fn first_public_key(
        &self,
        account_id: &str,
    ) -> Result<Option<String>, RegistrationError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "query",
            "params": {
                "request_type": "view_access_key_list",
                "finality": "final",
                "account_id": account_id,
            },
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .timeout(RPC_TIMEOUT)
            .send()
            .await?;

        let envelope: RpcEnvelope = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(RegistrationError::ChainApi(error.to_string()));
        }

        Ok(envelope
            .result
            .unwrap_or_default()
            .keys
            .into_iter()
            .next()
            .map(|entry| entry.public_key))
    }
}

// -- In-memory fakes --

#[derive(Debug, Default)]
struct InMemoryNearRpcState {
    keys: HashMap<String, String>,
}

/// In-memory NEAR RPC for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNearRpc {
    state: Arc<Mutex<InMemoryNearRpcState>>,
}

impl InMemoryNearRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a public key for an account.
    pub fn add_key(&self, account_id: &str, public_key: &str) {
        self.state
            .lock()
            .unwrap()
            .keys
            .insert(account_id.to_string(), public_key.to_string());
    }
}

#[async_trait]
impl NearRpc for InMemoryNearRpc {
    async fn first_public_key(
        &self,
        account_id: &str,
    ) -> Result<Option<String>, RegistrationError> {
        Ok(self.state.lock().unwrap().keys.get(account_id).cloned())
    }
}

#[derive(Debug, Default)]
struct InMemoryNearWalletState {
    created: Vec<(String, String)>,
    existing: HashSet<String>,
    fail: bool,
}

/// In-memory NEAR wallet for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNearWallet {
    state: Arc<Mutex<InMemoryNearWalletState>>,
}

impl InMemoryNearWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an account as already existing on-chain.
    pub fn mark_existing(&self, account_id: &str) {
        self.state
            .lock()
            .unwrap()
            .existing
            .insert(account_id.to_string());
    }

    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Recorded (account, public key) creations.
    pub fn created(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().created.clone()
    }
}

#[async_trait]
impl NearWallet for InMemoryNearWallet {
    fn account_id(&self) -> String {
        "platform.near".to_string()
    }

    async fn create_account(
        &self,
        new_account_id: &str,
        public_key: &str,
        _deposit_yocto: u128,
    ) -> Result<String, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(RegistrationError::ChainApi(
                "create_account panicked".to_string(),
            ));
        }
        if state.existing.contains(new_account_id) {
            return Err(RegistrationError::ChainApi(format!(
                "AccountAlreadyExists: {new_account_id}"
            )));
        }
        state
            .created
            .push((new_account_id.to_string(), public_key.to_string()));
        Ok(format!("near-tx-{:04}", state.created.len()))
    }
}
