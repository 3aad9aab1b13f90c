//! Execution environment around an exchange.
//!
//! [`Host`] owns everything outside the exchange's own state: the native
//! value balances (the reserve is simply the exchange address's balance),
//! the tradeable-unit ledger, the clock, and the value-receipt hooks of
//! recipients. Outgoing value transfers run the recipient's hook, which can
//! call back into the exchange as the recipient. That is where reentrancy
//! comes from.

use std::{collections::HashMap, fmt, rc::Rc};

use chrono::{DateTime, Utc};
use curvesale_admission::MembershipProof;
use curvesale_types::{Address, CurveSaleError, Result, SaleEvent};
use tracing::{debug, warn};

use crate::{
    exchange::{BuyReceipt, Exchange, SellReceipt},
    ledger::ValueLedger,
};

/// Code that runs when an address receives native value.
///
/// Returning an error makes the transfer, and the call that issued it, fail.
pub trait ValueReceiver<L: ValueLedger> {
    fn on_value_received(
        &self,
        recipient: &mut Recipient<'_, L>,
        from: Address,
        amount: u128,
    ) -> Result<()>;
}

/// What a hook can do while it runs: read the host and the exchange, and act
/// on the exchange or spend native value as the recipient and nobody else.
pub struct Recipient<'a, L: ValueLedger> {
    host: &'a mut Host<L>,
    exchange: &'a mut Exchange,
    address: Address,
}

impl<L: ValueLedger> Recipient<'_, L> {
    /// The address the hook acts as.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn host(&self) -> &Host<L> {
        &*self.host
    }

    #[must_use]
    pub fn exchange(&self) -> &Exchange {
        &*self.exchange
    }

    pub fn take_events(&mut self) -> Result<Vec<SaleEvent>> {
        self.exchange.take_events()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.exchange.pause(self.address)
    }

    pub fn unpause(&mut self) -> Result<()> {
        self.exchange.unpause(self.address)
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<()> {
        self.exchange.transfer_ownership(self.address, new_owner)
    }
}

impl<L: ValueLedger + Clone> Recipient<'_, L> {
    pub fn buy(&mut self, proof: &MembershipProof, payment: u128) -> Result<BuyReceipt> {
        self.exchange.buy(self.host, self.address, proof, payment)
    }

    pub fn sell(&mut self, quantity: u128) -> Result<SellReceipt> {
        self.exchange.sell(self.host, self.address, quantity)
    }

    pub fn withdraw(&mut self) -> Result<u128> {
        self.exchange.withdraw(self.host, self.address)
    }

    /// Send the recipient's own native value to `to`.
    pub fn send_value(&mut self, to: &Address, amount: u128) -> Result<()> {
        let from = self.address;
        self.host.send_value(self.exchange, &from, to, amount)
    }
}

/// Restorable copy of the host state taken at the start of an atomic call.
#[derive(Debug, Clone)]
pub struct HostCheckpoint<L> {
    ledger: L,
    balances: HashMap<Address, u128>,
}

pub struct Host<L: ValueLedger> {
    ledger: L,
    balances: HashMap<Address, u128>,
    now: DateTime<Utc>,
    receivers: HashMap<Address, Rc<dyn ValueReceiver<L>>>,
}

impl<L: ValueLedger> Host<L> {
    #[must_use]
    pub fn new(ledger: L, now: DateTime<Utc>) -> Self {
        Self {
            ledger,
            balances: HashMap::new(),
            now,
            receivers: HashMap::new(),
        }
    }

    // --- Clock ---

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn set_time(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    // --- Ledger ---

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    // --- Native value ---

    #[must_use]
    pub fn native_balance(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Sum of all native balances.
    #[must_use]
    pub fn total_native(&self) -> u128 {
        self.balances.values().sum()
    }

    /// Credit `amount` of new native value to `to`.
    pub fn mint_native(&mut self, to: &Address, amount: u128) -> Result<()> {
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(CurveSaleError::overflow("mint_native"))?;
        Ok(())
    }

    /// Move native value without running any hook. Used for value attached
    /// to a call, which the callee accepts as part of that call.
    pub(crate) fn move_value(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(CurveSaleError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        self.balances.insert(*from, available - amount);
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(CurveSaleError::overflow("move_value"))?;
        self.balances.insert(*to, credited);
        Ok(())
    }

    // --- Hooks ---

    pub fn register_receiver(&mut self, address: Address, receiver: Rc<dyn ValueReceiver<L>>) {
        self.receivers.insert(address, receiver);
    }

    pub fn unregister_receiver(&mut self, address: &Address) {
        self.receivers.remove(address);
    }
}

impl<L: ValueLedger + Clone> Host<L> {
    /// Send native value and run the recipient's hook, if any.
    ///
    /// Value sent to the exchange itself is routed to
    /// [`Exchange::receive_value`], which rejects it. A failing hook surfaces
    /// as [`CurveSaleError::ValueTransferFailed`]. On any error the host is
    /// left exactly as it was.
    pub fn send_value(
        &mut self,
        exchange: &mut Exchange,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        if *to == exchange.address() {
            return exchange.receive_value(*from, amount);
        }

        let checkpoint = self.checkpoint();
        self.move_value(from, to, amount)?;

        let Some(receiver) = self.receivers.get(to).cloned() else {
            debug!(%from, %to, amount, "Value sent");
            return Ok(());
        };
        let mut recipient = Recipient {
            host: &mut *self,
            exchange: &mut *exchange,
            address: *to,
        };
        if let Err(e) = receiver.on_value_received(&mut recipient, *from, amount) {
            warn!(%from, %to, amount, error = %e, "Recipient rejected value");
            self.rollback(checkpoint);
            return Err(CurveSaleError::ValueTransferFailed {
                to: *to,
                reason: e.to_string(),
            });
        }
        debug!(%from, %to, amount, "Value sent (hook ran)");
        Ok(())
    }

    // --- Atomicity ---

    #[must_use]
    pub fn checkpoint(&self) -> HostCheckpoint<L> {
        HostCheckpoint {
            ledger: self.ledger.clone(),
            balances: self.balances.clone(),
        }
    }

    /// Restore balances and ledger. The clock and hooks are not rolled back.
    pub fn rollback(&mut self, checkpoint: HostCheckpoint<L>) {
        self.ledger = checkpoint.ledger;
        self.balances = checkpoint.balances;
    }
}

impl<L: ValueLedger + fmt::Debug> fmt::Debug for Host<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("ledger", &self.ledger)
            .field("balances", &self.balances)
            .field("now", &self.now)
            .field("receivers", &self.receivers.len())
            .finish()
    }
}
