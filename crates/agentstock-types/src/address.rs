//! Address types
//!
//! Wallets and deployed token instances live in separate namespaces, so
//! they get separate newtypes. Both are opaque strings: the ledger only
//! ever compares them for equality and uses them as map keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A wallet/account address (agent wallet, creator, buyer, seller).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Generate a fresh address.
    pub fn new() -> Self {
        Self(format!("addr_{}", Uuid::new_v4()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The address of a deployed token instance (a stock token or the
/// stable currency).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAddress(pub String);

impl TokenAddress {
    /// Generate a fresh token address.
    pub fn new() -> Self {
        Self(format!("token_{}", Uuid::new_v4()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The distinguished zero address. Never a valid token instance;
    /// configuring the ledger's stable currency to it is rejected.
    pub fn zero() -> Self {
        Self("0x0000000000000000000000000000000000000000".to_string())
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::zero()
    }
}

impl Default for TokenAddress {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_unique() {
        assert_ne!(Address::new(), Address::new());
        assert_ne!(TokenAddress::new(), TokenAddress::new());
    }

    #[test]
    fn test_zero_address() {
        assert!(TokenAddress::zero().is_zero());
        assert!(!TokenAddress::new().is_zero());
    }
}
