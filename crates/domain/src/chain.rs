//! The chain catalog.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A blockchain on which names can be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
    Near,
    Base,
    Arbitrum,
}

/// Static information about a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// Human-readable chain name.
    pub name: &'static str,
    /// The name suffix this chain registers, with a leading dot.
    pub tld: &'static str,
    /// Public registration site for the chain's name service.
    pub registration_url: &'static str,
}

impl Chain {
    /// Every supported chain.
    pub const ALL: [Chain; 5] = [
        Chain::Ethereum,
        Chain::Solana,
        Chain::Near,
        Chain::Base,
        Chain::Arbitrum,
    ];

    /// Returns static info for this chain.
    pub fn info(&self) -> ChainInfo {
        match self {
            Chain::Ethereum => ChainInfo {
                name: "Ethereum",
                tld: ".eth",
                registration_url: "https://app.ens.domains/",
            },
            Chain::Solana => ChainInfo {
                name: "Solana",
                tld: ".sol",
                registration_url: "https://www.sns.id/",
            },
            Chain::Near => ChainInfo {
                name: "NEAR",
                tld: ".near",
                registration_url: "https://near.org/",
            },
            Chain::Base => ChainInfo {
                name: "Base",
                tld: ".base.eth",
                registration_url: "https://www.base.org/names",
            },
            Chain::Arbitrum => ChainInfo {
                name: "Arbitrum",
                tld: ".arb",
                registration_url: "https://arb.space.id/",
            },
        }
    }

    /// The name suffix this chain registers.
    pub fn tld(&self) -> &'static str {
        self.info().tld
    }

    /// True when the chain's registration asset is the platform's own
    /// settlement asset (USDC custody on NEAR), so no swap is needed.
    pub fn is_settlement_native(&self) -> bool {
        matches!(self, Chain::Near)
    }

    /// Returns the chain identifier as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
            Chain::Near => "near",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Chain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethereum" => Ok(Chain::Ethereum),
            "solana" => Ok(Chain::Solana),
            "near" => Ok(Chain::Near),
            "base" => Ok(Chain::Base),
            "arbitrum" => Ok(Chain::Arbitrum),
            other => Err(DomainError::UnknownChain(other.to_string())),
        }
    }
}

/// Splits a full name into its label and chain.
///
/// `.base.eth` takes priority over `.eth`, matching the catalog order a
/// longest-suffix match would produce.
pub fn parse_name(full: &str) -> Option<(String, Chain)> {
    let lower = full.trim().to_lowercase();
    for (suffix, chain) in [
        (".base.eth", Chain::Base),
        (".arb", Chain::Arbitrum),
        (".eth", Chain::Ethereum),
        (".sol", Chain::Solana),
        (".near", Chain::Near),
    ] {
        if let Some(label) = lower.strip_suffix(suffix)
            && !label.is_empty()
        {
            return Some((label.to_string(), chain));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tld_mapping() {
        assert_eq!(Chain::Ethereum.tld(), ".eth");
        assert_eq!(Chain::Solana.tld(), ".sol");
        assert_eq!(Chain::Near.tld(), ".near");
        assert_eq!(Chain::Base.tld(), ".base.eth");
        assert_eq!(Chain::Arbitrum.tld(), ".arb");
    }

    #[test]
    fn test_only_near_is_settlement_native() {
        for chain in Chain::ALL {
            assert_eq!(chain.is_settlement_native(), chain == Chain::Near);
        }
    }

    #[test]
    fn test_parse_name_prefers_base_over_eth() {
        assert_eq!(
            parse_name("pulse.base.eth"),
            Some(("pulse".to_string(), Chain::Base))
        );
        assert_eq!(
            parse_name("pulse.eth"),
            Some(("pulse".to_string(), Chain::Ethereum))
        );
    }

    #[test]
    fn test_parse_name_all_suffixes() {
        assert_eq!(
            parse_name("a.sol"),
            Some(("a".to_string(), Chain::Solana))
        );
        assert_eq!(
            parse_name("pulse.near"),
            Some(("pulse".to_string(), Chain::Near))
        );
        assert_eq!(
            parse_name("pulse.arb"),
            Some(("pulse".to_string(), Chain::Arbitrum))
        );
    }

    #[test]
    fn test_parse_name_normalizes_case_and_whitespace() {
        assert_eq!(
            parse_name("  Pulse.ETH "),
            Some(("pulse".to_string(), Chain::Ethereum))
        );
    }

    #[test]
    fn test_parse_name_rejects_unknown_or_empty() {
        assert_eq!(parse_name("pulse.com"), None);
        assert_eq!(parse_name(".eth"), None);
        assert_eq!(parse_name("pulse"), None);
    }

    #[test]
    fn test_from_str_roundtrip() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_str(chain.as_str()).unwrap(), chain);
        }
        assert!(Chain::from_str("bitcoin").is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Chain::Ethereum).unwrap(),
            "\"ethereum\""
        );
        let chain: Chain = serde_json::from_str("\"base\"").unwrap();
        assert_eq!(chain, Chain::Base);
    }
}
