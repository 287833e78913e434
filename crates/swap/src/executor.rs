//! The swap executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::Chain;

use crate::bridge::{BridgeApi, BridgeStatus};
use crate::error::SwapError;
use crate::settlement::SettlementWallet;

/// Default spacing between bridge status probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default wall-clock ceiling on bridge settlement.
pub const MAX_WAIT: Duration = Duration::from_secs(300);

/// Result of a settled swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Destination-chain transaction hash, when the bridge reported one.
    pub tx_hash: Option<String>,
}

/// Drives one swap end to end: quote, fund the deposit address, poll the
/// bridge to a terminal status.
pub struct SwapExecutor {
    bridge: Arc<dyn BridgeApi>,
    wallet: Arc<dyn SettlementWallet>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl SwapExecutor {
    /// Creates an executor with production timing.
    pub fn new(bridge: Arc<dyn BridgeApi>, wallet: Arc<dyn SettlementWallet>) -> Self {
        Self {
            bridge,
            wallet,
            poll_interval: POLL_INTERVAL,
            max_wait: MAX_WAIT,
        }
    }

    /// Overrides poll interval and wall-clock ceiling (tests).
    pub fn with_timing(mut self, poll_interval: Duration, max_wait: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.max_wait = max_wait;
        self
    }

    /// Executes a swap of `amount` settlement-asset minor units into
    /// `chain`'s asset, delivered to `destination`.
    ///
    /// Any failure here is a saga failure for the caller, never partial
    /// success: once the transfer leaves custody, only a terminal SUCCESS
    /// from the bridge counts.
    #[tracing::instrument(skip(self))]
    pub async fn execute(
        &self,
        chain: Chain,
        amount: &str,
        destination: &str,
    ) -> Result<SwapOutcome, SwapError> {
        if chain.is_settlement_native() {
            return Err(SwapError::SettlementNative(chain));
        }

        let refund_to = self.wallet.account_id();
        let quote = self
            .bridge
            .quote(chain, amount, &refund_to, destination)
            .await?;
        if quote.deposit_address.is_empty() {
            return Err(SwapError::MissingDepositAddress);
        }

        tracing::info!(deposit = %quote.deposit_address, amount, "funding bridge deposit");
        self.wallet
            .transfer_usdc(&quote.deposit_address, amount)
            .await?;

        let started = Instant::now();
        loop {
            let update = self.bridge.status(&quote.deposit_address).await?;
            match update.status {
                BridgeStatus::Success => {
                    metrics::counter!("swaps_completed").increment(1);
                    metrics::histogram!("swap_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                    tracing::info!(tx_hash = ?update.destination_tx, "swap settled");
                    return Ok(SwapOutcome {
                        tx_hash: update.destination_tx,
                    });
                }
                BridgeStatus::Refunded => {
                    metrics::counter!("swaps_failed").increment(1);
                    return Err(SwapError::Refunded);
                }
                BridgeStatus::Expired => {
                    metrics::counter!("swaps_failed").increment(1);
                    return Err(SwapError::Expired);
                }
                _ => {}
            }
            if started.elapsed() >= self.max_wait {
                metrics::counter!("swaps_failed").increment(1);
                return Err(SwapError::TimedOut(self.max_wait.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
