//! Request validation for order creation.

use crate::{Chain, DomainError, chain};

/// Maximum length of a full name, suffix included.
pub const MAX_NAME_LEN: usize = 253;

/// Validates a label: lowercase alphanumerics, hyphens allowed only in the
/// interior.
pub fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Validates an EVM address: `0x` followed by 40 hex characters.
pub fn is_valid_evm_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates a Solana address: 32–44 base58 characters.
pub fn is_valid_solana_address(address: &str) -> bool {
    const BASE58: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58.contains(c))
}

/// Validates a NEAR account: a named `.near` account or a 64-character
/// implicit (hex public key) account.
pub fn is_valid_near_account(address: &str) -> bool {
    if address.len() == 64 && address.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }
    let Some(prefix) = address.strip_suffix(".near") else {
        return false;
    };
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Validates an owner address against the address format of its chain.
pub fn validate_owner_address(chain: Chain, address: &str) -> Result<(), DomainError> {
    let valid = match chain {
        Chain::Ethereum | Chain::Base | Chain::Arbitrum => is_valid_evm_address(address),
        Chain::Solana => is_valid_solana_address(address),
        Chain::Near => is_valid_near_account(address),
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidOwnerAddress { chain })
    }
}

/// Validates a full order request, returning the parsed label.
pub fn validate_order(name: &str, chain: Chain, owner_address: &str) -> Result<String, DomainError> {
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    let (label, parsed_chain) =
        chain::parse_name(name).ok_or_else(|| DomainError::InvalidName(name.to_string()))?;
    if parsed_chain != chain {
        return Err(DomainError::ChainMismatch {
            name: name.to_string(),
            chain,
        });
    }
    if !is_valid_label(&label) {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    validate_owner_address(chain, owner_address)?;
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_rules() {
        assert!(is_valid_label("pulse"));
        assert!(is_valid_label("pu-lse"));
        assert!(is_valid_label("a1"));
        assert!(!is_valid_label(""));
        assert!(!is_valid_label("-pulse"));
        assert!(!is_valid_label("pulse-"));
        assert!(!is_valid_label("Pulse"));
        assert!(!is_valid_label("pu_lse"));
    }

    #[test]
    fn test_evm_address() {
        assert!(is_valid_evm_address(
            "0x253553366Da8546fC250F225fe3d25d0C782303b"
        ));
        assert!(!is_valid_evm_address("253553366Da8546fC250F225fe3d25d0C782303b"));
        assert!(!is_valid_evm_address("0x1234"));
        assert!(!is_valid_evm_address("0xzz53553366Da8546fC250F225fe3d25d0C78230"));
    }

    #[test]
    fn test_solana_address() {
        assert!(is_valid_solana_address(
            "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T"
        ));
        assert!(!is_valid_solana_address("short"));
        // base58 excludes 0, O, I and l
        assert!(!is_valid_solana_address(
            "0Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T"
        ));
    }

    #[test]
    fn test_near_account() {
        assert!(is_valid_near_account("alice.near"));
        assert!(is_valid_near_account("a_b-c1.near"));
        assert!(is_valid_near_account(&"a".repeat(64).replace('a', "f")));
        assert!(!is_valid_near_account(".near"));
        assert!(!is_valid_near_account("alice.testnet"));
    }

    #[test]
    fn test_validate_order_happy_path() {
        let label = validate_order(
            "pulse.eth",
            Chain::Ethereum,
            "0x253553366Da8546fC250F225fe3d25d0C782303b",
        )
        .unwrap();
        assert_eq!(label, "pulse");
    }

    #[test]
    fn test_validate_order_chain_mismatch() {
        let err = validate_order(
            "pulse.eth",
            Chain::Solana,
            "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T",
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::ChainMismatch { .. }));
    }

    #[test]
    fn test_validate_order_wrong_address_format() {
        let err = validate_order("pulse.near", Chain::Near, "0x1234").unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidOwnerAddress { chain: Chain::Near }
        ));
    }
}
