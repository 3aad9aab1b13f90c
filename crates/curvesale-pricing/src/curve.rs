//! Linear price curve and its arithmetic-series math.
//!
//! ## Cost of a run of units
//!
//! ```text
//! cost(s, q) = Σ_{i=0}^{q-1} price(s+i) = q·(first + last) / 2
//!
//!   first = price(s)
//!   last  = price(s+q-1)
//! ```
//!
//! `q·(first+last)` is always even, so the division is exact.
//!
//! ## Units for a budget
//!
//! With `f = price(s)` and `d = price_increment`, `cost(s, q) ≤ B` is the
//! quadratic inequality `d·q² + (2f − d)·q − 2B ≤ 0`, whose positive root is
//!
//! ```text
//! q* = (√((2f − d)² + 8·d·B) − (2f − d)) / (2d)
//! ```
//!
//! `floor(q*)` is computed with an integer square root; flooring the root
//! first does not change the floored quotient, so the result is exactly the
//! largest `q` whose series cost fits the budget. The discriminant is formed
//! in `BigUint` because `(2f)²` outgrows `u128` long before any realistic
//! price does.

use curvesale_types::{CurveSaleError, Result};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::math::isqrt;

/// `price(n) = initial_price + price_increment · n`, in value base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearCurve {
    initial_price: u128,
    price_increment: u128,
}

impl LinearCurve {
    /// Both parameters must be non-zero: the curve is strictly increasing.
    pub fn new(initial_price: u128, price_increment: u128) -> Result<Self> {
        if initial_price == 0 || price_increment == 0 {
            return Err(CurveSaleError::InvalidConfig {
                reason: "curve requires non-zero initial price and increment".into(),
            });
        }
        Ok(Self {
            initial_price,
            price_increment,
        })
    }

    #[must_use]
    pub fn initial_price(&self) -> u128 {
        self.initial_price
    }

    #[must_use]
    pub fn price_increment(&self) -> u128 {
        self.price_increment
    }

    /// Price of the unit at position `n` (0-based).
    pub fn price_at(&self, n: u128) -> Result<u128> {
        self.price_increment
            .checked_mul(n)
            .and_then(|step| step.checked_add(self.initial_price))
            .ok_or(CurveSaleError::overflow("price_at"))
    }

    /// Total price of units `start .. start+quantity`.
    pub fn cost_between(&self, start: u128, quantity: u128) -> Result<u128> {
        if quantity == 0 {
            return Ok(0);
        }
        let last_index = start
            .checked_add(quantity - 1)
            .ok_or(CurveSaleError::overflow("cost_between"))?;
        let first = self.price_at(start)?;
        let last = self.price_at(last_index)?;

        let total = first
            .checked_add(last)
            .and_then(|pair| pair.checked_mul(quantity))
            .ok_or(CurveSaleError::overflow("cost_between"))?;
        Ok(total / 2)
    }

    /// Largest `q` with `cost_between(start, q) ≤ budget`. Unbounded by supply.
    pub fn max_quantity_for_budget(&self, start: u128, budget: u128) -> Result<u128> {
        let first = self.price_at(start)?;
        if budget < first {
            return Ok(0);
        }

        let d = BigUint::from(self.price_increment);
        let two_f = BigUint::from(first) * 2u32;
        let eight_d_budget = &d * BigUint::from(budget) * 8u32;
        let two_d = d.clone() * 2u32;

        // The linear coefficient (2f − d) may be negative when the increment
        // exceeds twice the current price.
        let numerator = if two_f >= d {
            let b = two_f - &d;
            let root = isqrt(&(&b * &b + eight_d_budget));
            root - b
        } else {
            let b = d.clone() - two_f;
            let root = isqrt(&(&b * &b + eight_d_budget));
            root + b
        };

        (numerator / two_d)
            .to_u128()
            .ok_or(CurveSaleError::overflow("max_quantity_for_budget"))
    }
}
