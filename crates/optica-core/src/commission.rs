//! # Commission Calculation
//!
//! Derives a seller's commission quote from a sale total.
//!
//! The quote is computed once, at sale creation. Cancel and reactivate only
//! flip the stored row's status; the amount is never recomputed.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Rate;
use crate::DEFAULT_COMMISSION_BPS;

/// Result of [`CommissionCalculator::compute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionQuote {
    pub base: Money,
    pub rate: Rate,
    pub amount: Money,
}

/// Computes commissions with a store-wide fallback rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionCalculator {
    fallback: Rate,
}

impl CommissionCalculator {
    pub fn new(fallback: Rate) -> Self {
        CommissionCalculator { fallback }
    }

    pub fn fallback(&self) -> Rate {
        self.fallback
    }

    /// Quotes a commission on `sale_total`.
    ///
    /// ## Example
    /// ```rust
    /// use optica_core::commission::CommissionCalculator;
    /// use optica_core::money::Money;
    ///
    /// let quote = CommissionCalculator::default().compute(None, Money::from_cents(100_000));
    /// assert_eq!(quote.rate.bps(), 500);
    /// assert_eq!(quote.amount.cents(), 5_000); // R$50.00
    /// ```
    pub fn compute(&self, seller_rate: Option<Rate>, sale_total: Money) -> CommissionQuote {
        let rate = seller_rate.unwrap_or(self.fallback);
        CommissionQuote {
            base: sale_total,
            rate,
            amount: sale_total.apply_rate(rate),
        }
    }
}

impl Default for CommissionCalculator {
    fn default() -> Self {
        CommissionCalculator::new(Rate::from_bps(DEFAULT_COMMISSION_BPS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_rate() {
        let quote = CommissionCalculator::default().compute(None, Money::from_cents(100_000));
        assert_eq!(quote.base.cents(), 100_000);
        assert_eq!(quote.amount.cents(), 5_000);
    }

    #[test]
    fn test_seller_rate_wins() {
        let calc = CommissionCalculator::new(Rate::from_bps(500));
        let quote = calc.compute(Some(Rate::from_bps(250)), Money::from_cents(100_000));
        assert_eq!(quote.rate.bps(), 250);
        assert_eq!(quote.amount.cents(), 2_500);

        let zero = calc.compute(Some(Rate::zero()), Money::from_cents(100_000));
        assert!(zero.amount.is_zero());
    }

    #[test]
    fn test_rounding() {
        // 5% of R$0.30 = 1.5 centavos → 2
        let quote = CommissionCalculator::default().compute(None, Money::from_cents(30));
        assert_eq!(quote.amount.cents(), 2);
    }
}
