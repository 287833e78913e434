//! Shared identifiers for the name purchase platform.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet for order identifiers: lowercase alphanumerics with the
/// look-alike characters (0/o, 1/l/i) removed.
const ORDER_ID_ALPHABET: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Length of a generated order identifier.
const ORDER_ID_LEN: usize = 12;

/// Unique identifier for an order.
///
/// Wraps a short random string to provide type safety and prevent mixing up
/// order IDs with other string-based identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a new random order ID.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let id: String = (0..ORDER_ID_LEN)
            .map(|_| ORDER_ID_ALPHABET[rng.gen_range(0..ORDER_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Creates an order ID from an existing string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
