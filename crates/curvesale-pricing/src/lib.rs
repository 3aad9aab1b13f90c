//! # curvesale-pricing
//!
//! **PricingEngine**: the linear bonding curve behind a sale.
//!
//! ## The Curve
//!
//! ```text
//! price(n) = initial_price + price_increment * n
//!
//!   n = whole units already sold
//! ```
//!
//! Buying `q` units starting at `s` costs the arithmetic series
//! `price(s) + … + price(s+q-1) = q·(first+last)/2`. The inverse (how many
//! units a budget buys) is solved in closed form with the quadratic formula
//! and a Newton integer square root; no iteration over units, no floats.
//!
//! Every intermediate is checked: overflow fails the call, division floors,
//! and rounding always favors the exchange.
//!
//! ## Components
//!
//! - [`math::isqrt`]: Babylonian integer square root over `BigUint`
//! - [`LinearCurve`]: stateless series math
//! - [`PricingEngine`]: the curve bound to a finite supply

pub mod curve;
pub mod engine;
pub mod math;

pub use curve::LinearCurve;
pub use engine::{BuyQuote, PricingEngine};
