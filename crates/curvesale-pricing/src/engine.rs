//! The curve bound to a finite supply.
//!
//! The engine never stores how many units have been sold: every call takes
//! `sold` as observed by the caller (derived from the ledger), so the curve
//! can not drift from actual holdings.

use curvesale_types::{CurveSaleError, Result, SaleConfig};
use tracing::debug;

use crate::curve::LinearCurve;

/// Outcome of pricing a budget against the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyQuote {
    /// Whole units granted.
    pub quantity: u128,
    /// Exact series cost of those units.
    pub cost: u128,
    /// `budget − cost`, returned to the buyer.
    pub refund: u128,
}

/// Prices buys and sells along a [`LinearCurve`] capped at `initial_supply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEngine {
    curve: LinearCurve,
    initial_supply: u128,
}

impl PricingEngine {
    /// Bind `curve` to `initial_supply` units.
    ///
    /// Rejects curves whose full-supply cost does not fit `u128`, so no
    /// in-range call can overflow later.
    pub fn new(curve: LinearCurve, initial_supply: u128) -> Result<Self> {
        if initial_supply == 0 {
            return Err(CurveSaleError::InvalidConfig {
                reason: "initial supply must be > 0".into(),
            });
        }
        curve
            .cost_between(0, initial_supply)
            .map_err(|_| CurveSaleError::InvalidConfig {
                reason: format!("curve cost over {initial_supply} units overflows"),
            })?;
        Ok(Self {
            curve,
            initial_supply,
        })
    }

    pub fn from_config(config: &SaleConfig) -> Result<Self> {
        let curve = LinearCurve::new(config.initial_price, config.price_increment)?;
        Self::new(curve, config.initial_supply)
    }

    #[must_use]
    pub fn curve(&self) -> &LinearCurve {
        &self.curve
    }

    #[must_use]
    pub fn initial_supply(&self) -> u128 {
        self.initial_supply
    }

    /// Units still purchasable after `sold`.
    pub fn remaining(&self, sold: u128) -> Result<u128> {
        self.initial_supply
            .checked_sub(sold)
            .ok_or(CurveSaleError::overflow("remaining"))
    }

    /// Marginal price of the next unit.
    pub fn current_price(&self, sold: u128) -> Result<u128> {
        self.curve.price_at(sold)
    }

    /// Largest affordable quantity for `budget`, clamped to remaining supply.
    pub fn quantity_for_budget(&self, sold: u128, budget: u128) -> Result<u128> {
        let remaining = self.remaining(sold)?;
        if remaining == 0 {
            return Ok(0);
        }
        let unbounded = self.curve.max_quantity_for_budget(sold, budget)?;
        Ok(unbounded.min(remaining))
    }

    /// Cost of buying the next `quantity` units (`sold .. sold+quantity`).
    pub fn cost_for_quantity(&self, sold: u128, quantity: u128) -> Result<u128> {
        let remaining = self.remaining(sold)?;
        if quantity > remaining {
            return Err(CurveSaleError::InsufficientSupply {
                requested: quantity,
                available: remaining,
            });
        }
        self.curve.cost_between(sold, quantity)
    }

    /// Value released for returning the last `quantity` units sold
    /// (`sold−quantity .. sold`): exactly what they cost on the way up.
    pub fn payout_for_quantity(&self, sold: u128, quantity: u128) -> Result<u128> {
        let start = sold
            .checked_sub(quantity)
            .ok_or(CurveSaleError::InsufficientUnitsSold {
                requested: quantity,
                sold,
            })?;
        self.curve.cost_between(start, quantity)
    }

    /// Full buy quote: quantity, exact cost and refund for `budget`.
    pub fn quote_buy(&self, sold: u128, budget: u128) -> Result<BuyQuote> {
        let quantity = self.quantity_for_budget(sold, budget)?;
        let cost = self.cost_for_quantity(sold, quantity)?;
        let refund = budget
            .checked_sub(cost)
            .ok_or(CurveSaleError::overflow("quote_buy refund"))?;
        debug!(sold, budget, quantity, cost, refund, "Buy quote");
        Ok(BuyQuote {
            quantity,
            cost,
            refund,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn reference_engine() -> PricingEngine {
        PricingEngine::from_config(&SaleConfig::sample()).unwrap()
    }

    fn brute_max(engine: &PricingEngine, sold: u128, budget: u128) -> u128 {
        let remaining = engine.remaining(sold).unwrap();
        let mut q = 0;
        let mut spent = 0;
        while q < remaining {
            let next = engine.current_price(sold + q).unwrap();
            if spent + next > budget {
                break;
            }
            spent += next;
            q += 1;
        }
        q
    }

    #[test]
    fn reference_scenario() {
        let engine = reference_engine();
        let quote = engine.quote_buy(0, ONE).unwrap();
        assert_eq!(quote.quantity, 132);
        assert_eq!(quote.cost, 996_600_000_000_000_000);
        assert_eq!(quote.refund, 3_400_000_000_000_000);

        // Selling the same 132 back releases exactly what they cost.
        let payout = engine.payout_for_quantity(132, 132).unwrap();
        assert_eq!(payout, quote.cost);
    }

    #[test]
    fn overflowing_curve_rejected_at_construction() {
        let curve = LinearCurve::new(u128::MAX / 4, 1).unwrap();
        let err = PricingEngine::new(curve, 10).unwrap_err();
        assert!(matches!(err, CurveSaleError::InvalidConfig { .. }));
    }

    #[test]
    fn zero_supply_rejected() {
        let curve = LinearCurve::new(1, 1).unwrap();
        assert!(PricingEngine::new(curve, 0).is_err());
    }

    #[test]
    fn quantity_clamped_to_remaining_supply() {
        let curve = LinearCurve::new(1, 1).unwrap();
        let engine = PricingEngine::new(curve, 5).unwrap();
        assert_eq!(engine.quantity_for_budget(0, 1_000_000).unwrap(), 5);
        assert_eq!(engine.quantity_for_budget(3, 1_000_000).unwrap(), 2);
        assert_eq!(engine.quantity_for_budget(5, 1_000_000).unwrap(), 0);

        let quote = engine.quote_buy(3, 1_000_000).unwrap();
        assert_eq!(quote.quantity, 2);
        assert_eq!(quote.cost, 4 + 5);
        assert_eq!(quote.refund, 1_000_000 - 9);
    }

    #[test]
    fn cost_beyond_supply_is_insufficient_supply() {
        let curve = LinearCurve::new(1, 1).unwrap();
        let engine = PricingEngine::new(curve, 5).unwrap();
        let err = engine.cost_for_quantity(4, 2).unwrap_err();
        assert!(matches!(
            err,
            CurveSaleError::InsufficientSupply {
                requested: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn selling_more_than_sold_fails_closed() {
        let engine = reference_engine();
        let err = engine.payout_for_quantity(10, 11).unwrap_err();
        assert!(matches!(
            err,
            CurveSaleError::InsufficientUnitsSold {
                requested: 11,
                sold: 10
            }
        ));
    }

    #[test]
    fn sold_above_supply_is_overflow() {
        let curve = LinearCurve::new(1, 1).unwrap();
        let engine = PricingEngine::new(curve, 5).unwrap();
        assert!(matches!(
            engine.remaining(6),
            Err(CurveSaleError::ArithmeticOverflow { .. })
        ));
    }

    proptest! {
        #[test]
        fn solver_is_exhaustive(
            price in 1u128..50,
            increment in 1u128..50,
            supply in 1u128..40,
            sold_frac in 0u128..100,
            budget in 0u128..20_000,
        ) {
            let engine = PricingEngine::new(LinearCurve::new(price, increment).unwrap(), supply).unwrap();
            let sold = supply * sold_frac / 100;
            let q = engine.quantity_for_budget(sold, budget).unwrap();
            prop_assert_eq!(q, brute_max(&engine, sold, budget));
        }

        #[test]
        fn solver_never_overcharges(
            price in 1u128..1_000_000_000_000_000,
            increment in 1u128..1_000_000_000_000_000,
            sold in 0u128..1_000,
            budget in 0u128..1_000_000_000_000_000_000_000,
        ) {
            let engine = PricingEngine::new(LinearCurve::new(price, increment).unwrap(), 10_000).unwrap();
            let quote = engine.quote_buy(sold, budget).unwrap();
            prop_assert!(quote.cost <= budget);
            prop_assert_eq!(quote.cost + quote.refund, budget);
            if quote.quantity < engine.remaining(sold).unwrap() {
                let next = engine.cost_for_quantity(sold, quote.quantity + 1).unwrap();
                prop_assert!(next > budget);
            }
        }

        #[test]
        fn price_is_non_decreasing(sold in 0u128..999_999, step in 0u128..1_000) {
            let engine = reference_engine();
            let later = (sold + step).min(engine.initial_supply());
            prop_assert!(engine.current_price(later).unwrap() >= engine.current_price(sold).unwrap());
        }

        #[test]
        fn buy_then_sell_never_pays_out_more(sold in 0u128..10_000, budget in 0u128..100_000_000_000_000_000_000) {
            let engine = reference_engine();
            let quote = engine.quote_buy(sold, budget).unwrap();
            let payout = engine.payout_for_quantity(sold + quote.quantity, quote.quantity).unwrap();
            prop_assert!(payout <= budget);
            prop_assert_eq!(payout, quote.cost);
        }
    }
}
