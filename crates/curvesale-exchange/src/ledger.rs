//! The tradeable-unit ledger the exchange custodies.
//!
//! The exchange never implements its own token book; it drives whatever
//! ledger it is given through [`ValueLedger`]. Any ledger failure aborts the
//! calling operation.

use curvesale_types::{Address, Result};

/// Minimal fungible-balance contract: balance query, direct transfer and
/// allowance-based pull.
pub trait ValueLedger {
    /// Balance of `owner` in ledger base units.
    fn balance_of(&self, owner: &Address) -> u128;

    /// Move `amount` from `sender` to `to`.
    fn transfer(&mut self, sender: &Address, to: &Address, amount: u128) -> Result<()>;

    /// Move `amount` from `from` to `to` on `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()>;
}

#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryLedger;

#[cfg(any(test, feature = "test-helpers"))]
mod memory {
    use std::collections::{HashMap, HashSet};

    use curvesale_types::{Address, CurveSaleError, Result};

    use super::ValueLedger;

    /// In-memory ledger with allowances and failure injection.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryLedger {
        balances: HashMap<Address, u128>,
        allowances: HashMap<(Address, Address), u128>,
        rejected: HashSet<Address>,
        total_supply: u128,
    }

    impl MemoryLedger {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create `amount` new units for `to`.
        pub fn mint(&mut self, to: &Address, amount: u128) -> Result<()> {
            let balance = self.balances.entry(*to).or_insert(0);
            *balance = balance
                .checked_add(amount)
                .ok_or(CurveSaleError::overflow("mint"))?;
            self.total_supply = self
                .total_supply
                .checked_add(amount)
                .ok_or(CurveSaleError::overflow("mint"))?;
            Ok(())
        }

        /// Set `spender`'s allowance over `owner`'s balance.
        pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
            self.allowances.insert((*owner, *spender), amount);
        }

        #[must_use]
        pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
            self.allowances
                .get(&(*owner, *spender))
                .copied()
                .unwrap_or(0)
        }

        /// Make every later transfer into `recipient` fail.
        pub fn reject_transfers_to(&mut self, recipient: Address) {
            self.rejected.insert(recipient);
        }

        #[must_use]
        pub fn total_supply(&self) -> u128 {
            self.total_supply
        }

        fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
            if self.rejected.contains(to) {
                return Err(CurveSaleError::LedgerTransferFailed {
                    reason: format!("recipient {to} rejects transfers"),
                });
            }
            let available = self.balance_of(from);
            if available < amount {
                return Err(CurveSaleError::InsufficientLedgerBalance {
                    needed: amount,
                    available,
                });
            }
            self.balances.insert(*from, available - amount);
            let credited = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(CurveSaleError::overflow("ledger transfer"))?;
            self.balances.insert(*to, credited);
            Ok(())
        }
    }

    impl ValueLedger for MemoryLedger {
        fn balance_of(&self, owner: &Address) -> u128 {
            self.balances.get(owner).copied().unwrap_or(0)
        }

        fn transfer(&mut self, sender: &Address, to: &Address, amount: u128) -> Result<()> {
            self.move_balance(sender, to, amount)
        }

        fn transfer_from(
            &mut self,
            spender: &Address,
            from: &Address,
            to: &Address,
            amount: u128,
        ) -> Result<()> {
            let approved = self.allowance(from, spender);
            if approved < amount {
                return Err(CurveSaleError::InsufficientAllowance {
                    needed: amount,
                    approved,
                });
            }
            self.move_balance(from, to, amount)?;
            self.allowances.insert((*from, *spender), approved - amount);
            Ok(())
        }
    }
}
