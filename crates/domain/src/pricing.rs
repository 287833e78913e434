//! Static pricing for name registration.

use crate::{Chain, Money};

/// Flat platform fee added to every quote.
pub const PROCESSING_FEE: Money = Money::from_cents(100);

/// Base registration price for a label on a chain.
///
/// Short labels carry registry premiums on most chains.
pub fn base_price(chain: Chain, label: &str) -> Money {
    match chain {
        Chain::Ethereum => match label.len() {
            0..=3 => Money::from_dollars(640),
            4 => Money::from_dollars(160),
            _ => Money::from_dollars(8),
        },
        Chain::Solana => match label.len() {
            0..=1 => Money::from_dollars(750),
            2 => Money::from_dollars(700),
            3 => Money::from_dollars(640),
            4 => Money::from_dollars(160),
            _ => Money::from_dollars(20),
        },
        Chain::Near => Money::from_cents(50),
        Chain::Base => match label.len() {
            0..=3 => Money::from_dollars(100),
            4 => Money::from_dollars(10),
            _ => Money::from_cents(10),
        },
        Chain::Arbitrum => match label.len() {
            0..=3 => Money::from_dollars(640),
            4 => Money::from_dollars(160),
            _ => Money::from_dollars(8),
        },
    }
}

/// Quoted price for a label: base price plus the processing fee.
pub fn price_for(chain: Chain, label: &str) -> Money {
    base_price(chain, label) + PROCESSING_FEE
}
