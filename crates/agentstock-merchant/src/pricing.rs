//! Repricing strategies
//!
//! After every non-empty batch fulfillment the agent's quoted price is
//! recomputed from the prior price and the total volume just sold. The
//! rule is pluggable so deployments can tune or replace the curve
//! without touching the settlement path.

use agentstock_types::{TokenAmount, UsdcAmount};

/// Smallest representable price: one minor unit of the stable currency.
pub const PRICE_FLOOR: u128 = 1;

/// A deterministic repricing rule.
///
/// Implementations must be pure functions of their inputs; for any
/// `total_tokens_sold > 0` the result must differ from `old_price`
/// unless `old_price` already sits at [`PRICE_FLOOR`].
pub trait RepricingStrategy: Send + Sync {
    fn reprice(&self, old_price: UsdcAmount, total_tokens_sold: TokenAmount) -> UsdcAmount;
}

/// Inverse-linear decay proportional to sold volume:
///
/// `new = old * scale / (scale + sold)`
///
/// Integer floor division makes this strictly decreasing for any
/// positive sale volume while the prior price is above the floor, and
/// larger batches move the price further than small ones.
#[derive(Debug, Clone, Copy)]
pub struct InverseLinearDecay {
    scale: u128,
}

impl InverseLinearDecay {
    pub fn new(scale: u128) -> Self {
        // A zero scale would zero every price immediately.
        Self { scale: scale.max(1) }
    }
}

impl Default for InverseLinearDecay {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl RepricingStrategy for InverseLinearDecay {
    fn reprice(&self, old_price: UsdcAmount, total_tokens_sold: TokenAmount) -> UsdcAmount {
        if total_tokens_sold.is_zero() || old_price.0 <= PRICE_FLOOR {
            return UsdcAmount::new(old_price.0.max(PRICE_FLOOR));
        }

        let divisor = self.scale.saturating_add(total_tokens_sold.0 as u128);
        let scaled = match old_price.0.checked_mul(self.scale) {
            Some(scaled) => scaled / divisor,
            // Product too large for u128: divide first. Loses precision,
            // never correctness; the clamp below keeps the move strict.
            None => old_price.0 / (divisor / self.scale).max(1),
        };

        UsdcAmount::new(scaled.clamp(PRICE_FLOOR, old_price.0 - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_USDC: UsdcAmount = UsdcAmount(1_000_000);

    #[test]
    fn test_price_strictly_decreases() {
        let strategy = InverseLinearDecay::default();
        let new = strategy.reprice(ONE_USDC, TokenAmount::new(60));
        assert!(new < ONE_USDC);
        // 1_000_000 * 10_000 / 10_060
        assert_eq!(new, UsdcAmount::new(994_035));
    }

    #[test]
    fn test_larger_volume_decays_further() {
        let strategy = InverseLinearDecay::default();
        let small = strategy.reprice(ONE_USDC, TokenAmount::new(10));
        let large = strategy.reprice(ONE_USDC, TokenAmount::new(10_000));
        assert!(large < small);
    }

    #[test]
    fn test_deterministic() {
        let strategy = InverseLinearDecay::default();
        assert_eq!(
            strategy.reprice(ONE_USDC, TokenAmount::new(42)),
            strategy.reprice(ONE_USDC, TokenAmount::new(42))
        );
    }

    #[test]
    fn test_zero_volume_keeps_price() {
        let strategy = InverseLinearDecay::default();
        assert_eq!(strategy.reprice(ONE_USDC, TokenAmount::zero()), ONE_USDC);
    }

    #[test]
    fn test_price_never_falls_below_floor() {
        let strategy = InverseLinearDecay::default();
        let mut price = UsdcAmount::new(5);
        for _ in 0..100 {
            price = strategy.reprice(price, TokenAmount::new(1_000_000));
        }
        assert_eq!(price, UsdcAmount::new(PRICE_FLOOR));

        // At the floor the rule saturates
        assert_eq!(
            strategy.reprice(UsdcAmount::new(PRICE_FLOOR), TokenAmount::new(1)),
            UsdcAmount::new(PRICE_FLOOR)
        );
    }

    #[test]
    fn test_tiny_decay_still_moves_price() {
        let strategy = InverseLinearDecay::new(u128::MAX / 2);
        // Scale so large the quotient rounds back to old; the clamp
        // still forces a one-unit move.
        let new = strategy.reprice(ONE_USDC, TokenAmount::new(1));
        assert_eq!(new, UsdcAmount::new(999_999));
    }
}
