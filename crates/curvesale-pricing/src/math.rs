//! Integer square root.

use num_bigint::BigUint;
use num_traits::Zero;

/// `floor(√x)` by Newton's method.
///
/// Starts from `z = (x+1)/2` and iterates `z = (x/z + z)/2` while the guess
/// keeps shrinking. The sequence is strictly decreasing until it reaches
/// the floor root, so the loop always terminates.
pub fn isqrt(x: &BigUint) -> BigUint {
    if x.is_zero() {
        return BigUint::zero();
    }

    let mut z = (x.clone() + 1u32) / 2u32;
    let mut y = x.clone();

    while z < y {
        y = z;
        z = (x / &y + &y) / 2u32;
    }

    y
}
