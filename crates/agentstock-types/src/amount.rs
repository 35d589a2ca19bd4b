//! Amount types
//!
//! Stock tokens are whole units (the dedicated tokens carry zero
//! decimals), so [`TokenAmount`] is a plain `u64` count. Stable-currency
//! values are tracked in minor units (e.g. 10^-6 for a six-decimal
//! currency) as a `u128`, which also represents the quoted price per
//! token. All arithmetic is checked.

use crate::{MerchantError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A whole-number count of stock tokens. No fractional tokens exist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TokenAmount(pub u64);

impl TokenAmount {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MerchantError::AmountOverflow)
    }
}

impl Add for TokenAmount {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        self.checked_add(other).expect("token amount overflow")
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable-currency value in minor units.
///
/// Also used for the quoted price per token, which may carry sub-unit
/// precision even though token counts are integral.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct UsdcAmount(pub u128);

impl UsdcAmount {
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// One whole unit of a currency with the given number of decimals.
    pub fn one_unit(decimals: u8) -> Self {
        Self(10u128.pow(decimals as u32))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MerchantError::AmountOverflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MerchantError::AmountUnderflow)
    }

    /// Price-times-quantity: the cost or payout for a whole-token count
    /// at this per-token price.
    pub fn checked_mul_tokens(self, tokens: TokenAmount) -> Result<Self> {
        self.0
            .checked_mul(tokens.0 as u128)
            .map(Self)
            .ok_or(MerchantError::AmountOverflow)
    }
}

impl Add for UsdcAmount {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        self.checked_add(other).expect("usdc amount overflow")
    }
}

impl Sub for UsdcAmount {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        self.checked_sub(other).expect("usdc amount underflow")
    }
}

impl fmt::Display for UsdcAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_unit() {
        assert_eq!(UsdcAmount::one_unit(6), UsdcAmount::new(1_000_000));
        assert_eq!(UsdcAmount::one_unit(0), UsdcAmount::new(1));
    }

    #[test]
    fn test_cost_computation() {
        let price = UsdcAmount::one_unit(6);
        let cost = price.checked_mul_tokens(TokenAmount::new(100)).unwrap();
        assert_eq!(cost, UsdcAmount::new(100_000_000));
    }

    #[test]
    fn test_overflow_is_explicit() {
        let result = UsdcAmount::new(u128::MAX).checked_add(UsdcAmount::new(1));
        assert!(matches!(result, Err(MerchantError::AmountOverflow)));

        let result = UsdcAmount::zero().checked_sub(UsdcAmount::new(1));
        assert!(matches!(result, Err(MerchantError::AmountUnderflow)));
    }

    #[test]
    fn test_token_merge() {
        let total = TokenAmount::new(40).checked_add(TokenAmount::new(20)).unwrap();
        assert_eq!(total, TokenAmount::new(60));
    }
}
