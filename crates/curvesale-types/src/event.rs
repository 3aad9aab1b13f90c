//! Domain events emitted by the exchange for external indexers.
//!
//! Events are appended to the exchange's log only when the call that
//! produced them completes; a failed call leaves no events behind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Address;

/// Something observable happened to the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleEvent {
    /// `buyer` paid `value_paid` (after refund) for `quantity` units.
    Purchase {
        buyer: Address,
        value_paid: u128,
        quantity: u128,
    },
    /// `seller` returned `quantity` units and received `value_paid`.
    Sale {
        seller: Address,
        quantity: u128,
        value_paid: u128,
    },
    /// The owner drained the value reserve.
    Withdrawal { owner: Address, amount: u128 },
    Paused { by: Address },
    Unpaused { by: Address },
    OwnershipTransferred {
        previous: Address,
        new_owner: Address,
    },
}

impl fmt::Display for SaleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase {
                buyer,
                value_paid,
                quantity,
            } => write!(f, "PURCHASE {buyer} {quantity} units for {value_paid}"),
            Self::Sale {
                seller,
                quantity,
                value_paid,
            } => write!(f, "SALE {seller} {quantity} units for {value_paid}"),
            Self::Withdrawal { owner, amount } => write!(f, "WITHDRAWAL {owner} {amount}"),
            Self::Paused { by } => write!(f, "PAUSED by {by}"),
            Self::Unpaused { by } => write!(f, "UNPAUSED by {by}"),
            Self::OwnershipTransferred {
                previous,
                new_owner,
            } => write!(f, "OWNERSHIP {previous} -> {new_owner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_the_variant() {
        let ev = SaleEvent::Purchase {
            buyer: Address::derive("alice"),
            value_paid: 10,
            quantity: 2,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.starts_with("{\"purchase\":"), "{json}");
        let back: SaleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn display() {
        let ev = SaleEvent::Withdrawal {
            owner: Address::ZERO,
            amount: 7,
        };
        assert!(ev.to_string().starts_with("WITHDRAWAL"));
    }
}
