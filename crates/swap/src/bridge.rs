//! Bridge API contract and HTTP client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use domain::Chain;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SwapError;

/// Production API base of the 1-click bridge.
pub const DEFAULT_BASE_URL: &str = "https://1click.chaindefuser.com";

/// USDC on NEAR, the platform settlement asset.
pub const SETTLEMENT_ASSET: &str =
    "nep141:17208628f84f5d6ad33f0da3bbbeb27ffcb398eac501a31bd6ad2011e36133a1";

/// Slippage tolerance in basis points.
const SLIPPAGE_BPS: u32 = 500;

/// How long a quote's deposit address stays valid.
const QUOTE_DEADLINE: Duration = Duration::from_secs(30 * 60);

const QUOTE_TIMEOUT: Duration = Duration::from_secs(15);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Bridged representation of each destination chain's asset.
fn destination_asset(chain: Chain) -> Result<&'static str, SwapError> {
    match chain {
        Chain::Ethereum => Ok("nep141:eth.omft.near"),
        Chain::Solana => Ok("nep141:sol.omft.near"),
        Chain::Base => Ok("nep141:base.omft.near"),
        Chain::Arbitrum => Ok("nep141:arb.omft.near"),
        Chain::Near => Err(SwapError::SettlementNative(chain)),
    }
}

/// Bridge-reported state of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeStatus {
    PendingDeposit,
    KnownDepositTx,
    Processing,
    Success,
    Refunded,
    Expired,
}

impl BridgeStatus {
    /// True once the bridge will not change its mind.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BridgeStatus::Success | BridgeStatus::Refunded | BridgeStatus::Expired
        )
    }
}

/// A bridge quote carrying the one-time deposit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub deposit_address: String,
    pub amount_in: String,
    pub amount_out: String,
}

/// One status probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapUpdate {
    pub status: BridgeStatus,
    /// Destination-chain transaction hash, present once the swap settled.
    pub destination_tx: Option<String>,
}

/// Trait for bridge operations.
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Requests a quote for swapping `amount` of the settlement asset into
    /// `chain`'s asset, delivered to `recipient`, refundable to `refund_to`.
    async fn quote(
        &self,
        chain: Chain,
        amount: &str,
        refund_to: &str,
        recipient: &str,
    ) -> Result<Quote, SwapError>;

    /// Fetches the current status of the swap behind a deposit address.
    async fn status(&self, deposit_address: &str) -> Result<SwapUpdate, SwapError>;
}

// -- HTTP client --

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(rename = "depositAddress", default)]
    deposit_address: Option<String>,
    #[serde(rename = "amountIn", default)]
    amount_in: String,
    #[serde(rename = "amountOut", default)]
    amount_out: String,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    quote: QuoteBody,
}

/// Destination tx hashes arrive either bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TxHashRef {
    Plain(String),
    Object { hash: String },
}

impl TxHashRef {
    fn into_hash(self) -> String {
        match self {
            TxHashRef::Plain(hash) => hash,
            TxHashRef::Object { hash } => hash,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SwapDetails {
    #[serde(rename = "destinationChainTxHashes", default)]
    destination_chain_tx_hashes: Vec<TxHashRef>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: BridgeStatus,
    #[serde(rename = "swapDetails", default)]
    swap_details: SwapDetails,
}

/// HTTP client for the 1-click bridge API.
#[derive(Debug, Clone)]
pub struct OneClickClient {
    http: reqwest::Client,
    base_url: String,
}

impl OneClickClient {
    /// Creates a client against the production API.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the API base URL (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for OneClickClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BridgeApi for OneClickClient {
    #[tracing::instrument(skip(self))]
    async fn quote(
        &self,
        chain: Chain,
        amount: &str,
        refund_to: &str,
        recipient: &str,
    ) -> Result<Quote, SwapError> {
        let deadline = Utc::now() + QUOTE_DEADLINE;
        let body = json!({
            "dry": false,
            "swapType": "EXACT_INPUT",
            "slippageTolerance": SLIPPAGE_BPS,
            "originAsset": SETTLEMENT_ASSET,
            "depositType": "ORIGIN_CHAIN",
            "destinationAsset": destination_asset(chain)?,
            "amount": amount,
            "refundTo": refund_to,
            "refundType": "ORIGIN_CHAIN",
            "recipient": recipient,
            "recipientType": "DESTINATION_CHAIN",
            "deadline": deadline.to_rfc3339(),
        });

        let response = self
            .http
            .post(format!("{}/v0/quote", self.base_url))
            .json(&body)
            .timeout(QUOTE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "no body".to_string());
            return Err(SwapError::Api { status, body });
        }

        let envelope: QuoteEnvelope = response.json().await?;
        Ok(Quote {
            deposit_address: envelope.quote.deposit_address.unwrap_or_default(),
            amount_in: envelope.quote.amount_in,
            amount_out: envelope.quote.amount_out,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn status(&self, deposit_address: &str) -> Result<SwapUpdate, SwapError> {
        let response = self
            .http
            .get(format!("{}/v0/status", self.base_url))
            .query(&[("depositAddress", deposit_address)])
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "no body".to_string());
            return Err(SwapError::Api { status, body });
        }

        let envelope: StatusEnvelope = response.json().await?;
        Ok(SwapUpdate {
            status: envelope.status,
            destination_tx: envelope
                .swap_details
                .destination_chain_tx_hashes
                .into_iter()
                .next()
                .map(TxHashRef::into_hash),
        })
    }
}

// -- In-memory fake --

#[derive(Debug, Default)]
struct InMemoryBridgeState {
    updates: VecDeque<SwapUpdate>,
    quote_count: usize,
    status_count: usize,
    fail_on_quote: bool,
}

/// In-memory bridge for testing.
///
/// By default every swap settles immediately with a fixed destination hash.
/// A scripted sequence of status updates can be queued; the last update is
/// repeated once the queue drains.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBridge {
    state: Arc<Mutex<InMemoryBridgeState>>,
}

impl InMemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the status updates returned by successive probes.
    pub fn set_updates(&self, updates: Vec<SwapUpdate>) {
        self.state.lock().unwrap().updates = updates.into();
    }

    /// Shorthand for a single terminal status with no hash.
    pub fn set_outcome(&self, status: BridgeStatus) {
        self.set_updates(vec![SwapUpdate {
            status,
            destination_tx: None,
        }]);
    }

    pub fn set_fail_on_quote(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_quote = fail;
    }

    pub fn quote_count(&self) -> usize {
        self.state.lock().unwrap().quote_count
    }

    pub fn status_count(&self) -> usize {
        self.state.lock().unwrap().status_count
    }
}

#[async_trait]
impl BridgeApi for InMemoryBridge {
    async fn quote(
        &self,
        _chain: Chain,
        amount: &str,
        _refund_to: &str,
        _recipient: &str,
    ) -> Result<Quote, SwapError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_quote {
            return Err(SwapError::Api {
                status: 500,
                body: "quote unavailable".to_string(),
            });
        }
        state.quote_count += 1;
        Ok(Quote {
            deposit_address: format!("deposit-{:04}", state.quote_count),
            amount_in: amount.to_string(),
            amount_out: amount.to_string(),
        })
    }

    async fn status(&self, _deposit_address: &str) -> Result<SwapUpdate, SwapError> {
        let mut state = self.state.lock().unwrap();
        state.status_count += 1;
        if state.updates.len() > 1 {
            return Ok(state.updates.pop_front().unwrap());
        }
        Ok(state.updates.front().cloned().unwrap_or(SwapUpdate {
            status: BridgeStatus::Success,
            destination_tx: Some("0xswap".to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_asset_rejects_settlement_chain() {
        assert!(destination_asset(Chain::Ethereum).is_ok());
        assert!(matches!(
            destination_asset(Chain::Near),
            Err(SwapError::SettlementNative(Chain::Near))
        ));
    }

    #[test]
    fn test_status_envelope_accepts_both_hash_shapes() {
        let bare: StatusEnvelope = serde_json::from_str(
            r#"{"status": "SUCCESS", "swapDetails": {"destinationChainTxHashes": ["0xaaa"]}}"#,
        )
        .unwrap();
        assert_eq!(
            bare.swap_details
                .destination_chain_tx_hashes
                .into_iter()
                .next()
                .map(TxHashRef::into_hash)
                .as_deref(),
            Some("0xaaa")
        );

        let wrapped: StatusEnvelope = serde_json::from_str(
            r#"{"status": "SUCCESS", "swapDetails": {"destinationChainTxHashes": [{"hash": "0xbbb"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            wrapped
                .swap_details
                .destination_chain_tx_hashes
                .into_iter()
                .next()
                .map(TxHashRef::into_hash)
                .as_deref(),
            Some("0xbbb")
        );
    }

    #[test]
    fn test_status_envelope_tolerates_missing_details() {
        let envelope: StatusEnvelope =
            serde_json::from_str(r#"{"status": "PENDING_DEPOSIT"}"#).unwrap();
        assert_eq!(envelope.status, BridgeStatus::PendingDeposit);
        assert!(envelope.swap_details.destination_chain_tx_hashes.is_empty());
    }

    #[test]
    fn test_bridge_status_serde_and_terminality() {
        let status: BridgeStatus = serde_json::from_str("\"KNOWN_DEPOSIT_TX\"").unwrap();
        assert_eq!(status, BridgeStatus::KnownDepositTx);
        assert!(!status.is_terminal());
        assert!(BridgeStatus::Success.is_terminal());
        assert!(BridgeStatus::Refunded.is_terminal());
        assert!(BridgeStatus::Expired.is_terminal());
    }

    #[tokio::test]
    async fn test_in_memory_bridge_scripts_updates() {
        let bridge = InMemoryBridge::new();
        bridge.set_updates(vec![
            SwapUpdate {
                status: BridgeStatus::Processing,
                destination_tx: None,
            },
            SwapUpdate {
                status: BridgeStatus::Success,
                destination_tx: Some("0xfinal".to_string()),
            },
        ]);

        let first = bridge.status("deposit-0001").await.unwrap();
        assert_eq!(first.status, BridgeStatus::Processing);

        let second = bridge.status("deposit-0001").await.unwrap();
        assert_eq!(second.status, BridgeStatus::Success);
        assert_eq!(second.destination_tx.as_deref(), Some("0xfinal"));

        // Last update repeats.
        let third = bridge.status("deposit-0001").await.unwrap();
        assert_eq!(third.status, BridgeStatus::Success);
    }
}
