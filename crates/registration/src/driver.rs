//! Chain driver dispatch.

use domain::Chain;

use crate::arbitrum::ArbDriver;
use crate::base::BaseDriver;
use crate::ens::EnsDriver;
use crate::error::RegistrationError;
use crate::near::NearDriver;
use crate::progress::Progress;
use crate::solana::SnsDriver;

/// A successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// On-chain transaction hash of the registration call.
    pub tx_hash: String,
}

/// Closed union over the five chain drivers.
///
/// One variant per chain keeps dispatch total: adding a chain without a
/// driver fails to compile.
pub enum ChainDriver {
    Ens(EnsDriver),
    Basename(BaseDriver),
    Sns(SnsDriver),
    NearAccount(NearDriver),
    Arb(ArbDriver),
}

impl ChainDriver {
    /// The chain this driver registers on.
    pub fn chain(&self) -> Chain {
        match self {
            ChainDriver::Ens(_) => Chain::Ethereum,
            ChainDriver::Basename(_) => Chain::Base,
            ChainDriver::Sns(_) => Chain::Solana,
            ChainDriver::NearAccount(_) => Chain::Near,
            ChainDriver::Arb(_) => Chain::Arbitrum,
        }
    }

    /// Runs the chain's registration protocol for `label`, owned by `owner`.
    pub async fn register(
        &self,
        label: &str,
        owner: &str,
        progress: &Progress,
    ) -> Result<Registration, RegistrationError> {
        metrics::counter!("registration_attempts", "chain" => self.chain().as_str()).increment(1);
        match self {
            ChainDriver::Ens(driver) => driver.register(label, owner, progress).await,
            ChainDriver::Basename(driver) => driver.register(label, owner, progress).await,
            ChainDriver::Sns(driver) => driver.register(label, owner, progress).await,
            ChainDriver::NearAccount(driver) => driver.register(label, owner, progress).await,
            ChainDriver::Arb(driver) => driver.register(label, owner, progress).await,
        }
    }
}

/// One driver per chain, resolved through a total static lookup.
pub struct DriverSet {
    ethereum: ChainDriver,
    solana: ChainDriver,
    near: ChainDriver,
    base: ChainDriver,
    arbitrum: ChainDriver,
}

impl DriverSet {
    /// Assembles the full set; one concrete driver per chain.
    pub fn new(
        ens: EnsDriver,
        base: BaseDriver,
        sns: SnsDriver,
        near: NearDriver,
        arbitrum: ArbDriver,
    ) -> Self {
        Self {
            ethereum: ChainDriver::Ens(ens),
            solana: ChainDriver::Sns(sns),
            near: ChainDriver::NearAccount(near),
            base: ChainDriver::Basename(base),
            arbitrum: ChainDriver::Arb(arbitrum),
        }
    }

    /// Resolves the driver for a chain.
    pub fn for_chain(&self, chain: Chain) -> &ChainDriver {
        match chain {
            Chain::Ethereum => &self.ethereum,
            Chain::Solana => &self.solana,
            Chain::Near => &self.near,
            Chain::Base => &self.base,
            Chain::Arbitrum => &self.arbitrum,
        }
    }
}
