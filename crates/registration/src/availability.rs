//! Name availability lookup contract.
//!
//! Chain registries are external collaborators; the core consumes this
//! interface only. Lookups are best-effort per name: a failed per-chain
//! query degrades to "unavailable" rather than raising.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use domain::{Chain, Money, parse_name, pricing};
use serde::Serialize;

/// Result of a single availability probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameCheck {
    /// Full name, e.g. `pulse.eth`.
    pub domain: String,
    pub label: String,
    pub chain: Chain,
    pub tld: String,
    pub available: bool,
    pub premium: bool,
    /// Quoted price when available.
    pub price: Option<Money>,
}

/// Trait for availability lookups against a chain registry.
#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
    /// Best-effort probe of `label` on `chain`.
    async fn check(&self, label: &str, chain: Chain) -> NameCheck;
}

/// Checks a batch of full names, skipping anything that does not parse.
pub async fn check_names(checker: &dyn AvailabilityChecker, names: &[String]) -> Vec<NameCheck> {
    let mut results = Vec::with_capacity(names.len());
    for name in names {
        if let Some((label, chain)) = parse_name(name) {
            results.push(checker.check(&label, chain).await);
        }
    }
    results
}

/// Fixed availability table for tests and default wiring: everything is
/// available unless explicitly marked taken.
#[derive(Debug, Default)]
pub struct FixedAvailability {
    taken: RwLock<HashSet<String>>,
}

impl FixedAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a full name (e.g. `pulse.eth`) as taken.
    pub fn mark_taken(&self, domain: &str) {
        self.taken.write().unwrap().insert(domain.to_string());
    }
}

#[async_trait]
impl AvailabilityChecker for FixedAvailability {
    async fn check(&self, label: &str, chain: Chain) -> NameCheck {
        let domain = format!("{label}{}", chain.tld());
        let available = !self.taken.read().unwrap().contains(&domain);
        NameCheck {
            domain,
            label: label.to_string(),
            chain,
            tld: chain.tld().to_string(),
            available,
            premium: false,
            price: available.then(|| pricing::price_for(chain, label)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_availability_defaults_to_available() {
        let checker = FixedAvailability::new();
        let check = checker.check("pulse", Chain::Ethereum).await;
        assert!(check.available);
        assert_eq!(check.domain, "pulse.eth");
        assert_eq!(check.price, Some(Money::from_cents(900)));
    }

    #[tokio::test]
    async fn test_taken_names_have_no_price() {
        let checker = FixedAvailability::new();
        checker.mark_taken("pulse.eth");

        let check = checker.check("pulse", Chain::Ethereum).await;
        assert!(!check.available);
        assert_eq!(check.price, None);

        // Same label on another chain is untouched.
        let check = checker.check("pulse", Chain::Solana).await;
        assert!(check.available);
    }

    #[tokio::test]
    async fn test_check_names_skips_unparseable() {
        let checker = FixedAvailability::new();
        let names = vec![
            "pulse.eth".to_string(),
            "garbage".to_string(),
            "pulse.base.eth".to_string(),
        ];
        let results = check_names(&checker, &names).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chain, Chain::Ethereum);
        assert_eq!(results[1].chain, Chain::Base);
    }
}
