//! Owner-only controls: pause, unpause, reserve withdrawal, ownership.
//!
//! Every entry point takes the reentrancy lock before checking the caller,
//! so an owner hook running during a payout cannot flip state mid-call.
//! Withdrawal stays available while paused.

use curvesale_types::{Address, CurveSaleError, Result, SaleEvent};
use tracing::info;

use crate::{exchange::Exchange, host::Host, ledger::ValueLedger};

impl Exchange {
    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if *caller == self.principal {
            Ok(())
        } else {
            Err(CurveSaleError::NotOwner { caller: *caller })
        }
    }

    /// Halt buy and sell.
    pub fn pause(&mut self, caller: Address) -> Result<()> {
        let _token = self.guard.enter()?;
        self.ensure_owner(&caller)?;
        if self.paused {
            return Err(CurveSaleError::AlreadyPaused);
        }
        self.paused = true;
        self.emit(SaleEvent::Paused { by: caller });
        info!(by = %caller, "Sale paused");
        Ok(())
    }

    /// Resume buy and sell.
    pub fn unpause(&mut self, caller: Address) -> Result<()> {
        let _token = self.guard.enter()?;
        self.ensure_owner(&caller)?;
        if !self.paused {
            return Err(CurveSaleError::NotPaused);
        }
        self.paused = false;
        self.emit(SaleEvent::Unpaused { by: caller });
        info!(by = %caller, "Sale unpaused");
        Ok(())
    }

    /// Send the whole value reserve to the owner. Returns the amount sent.
    pub fn withdraw<L: ValueLedger + Clone>(
        &mut self,
        host: &mut Host<L>,
        caller: Address,
    ) -> Result<u128> {
        self.atomically(host, |ex, host| {
            let _token = ex.guard.enter()?;
            ex.ensure_owner(&caller)?;

            let amount = ex.reserve_balance(host);
            if amount == 0 {
                return Err(CurveSaleError::NothingToWithdraw);
            }

            ex.emit(SaleEvent::Withdrawal {
                owner: caller,
                amount,
            });
            let exchange = ex.address;
            host.send_value(ex, &exchange, &caller, amount)?;

            info!(owner = %caller, amount, "Reserve withdrawn");
            Ok(amount)
        })
    }

    /// Hand ownership to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        let _token = self.guard.enter()?;
        self.ensure_owner(&caller)?;
        if new_owner.is_zero() {
            return Err(CurveSaleError::ZeroOwner);
        }
        self.principal = new_owner;
        self.emit(SaleEvent::OwnershipTransferred {
            previous: caller,
            new_owner,
        });
        info!(previous = %caller, %new_owner, "Ownership transferred");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use curvesale_admission::MembershipProof;
    use curvesale_types::SaleConfig;

    use super::*;
    use crate::ledger::MemoryLedger;

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn setup() -> (Host<MemoryLedger>, Exchange, Address) {
        let config = SaleConfig::sample();
        let owner = Address::derive("owner");
        let address = Address::derive("exchange");
        let mut ledger = MemoryLedger::new();
        ledger
            .mint(&address, config.total_base_supply().unwrap())
            .unwrap();
        let host = Host::new(ledger, config.open_start + Duration::minutes(5));
        let exchange = Exchange::deploy(config, owner, address).unwrap();
        (host, exchange, owner)
    }

    #[test]
    fn only_owner_pauses() {
        let (_, mut exchange, owner) = setup();
        let stranger = Address::derive("stranger");
        assert!(matches!(
            exchange.pause(stranger),
            Err(CurveSaleError::NotOwner { .. })
        ));
        exchange.pause(owner).unwrap();
        assert!(exchange.is_paused());
        assert!(matches!(
            exchange.pause(owner),
            Err(CurveSaleError::AlreadyPaused)
        ));
        exchange.unpause(owner).unwrap();
        assert!(matches!(
            exchange.unpause(owner),
            Err(CurveSaleError::NotPaused)
        ));
        assert_eq!(
            exchange.take_events().unwrap(),
            vec![SaleEvent::Paused { by: owner }, SaleEvent::Unpaused { by: owner }]
        );
    }

    #[test]
    fn paused_rejects_trading_before_other_checks() {
        let (mut host, mut exchange, owner) = setup();
        exchange.pause(owner).unwrap();
        let anyone = Address::derive("anyone");
        // Zero payment and zero quantity would fail anyway; paused wins.
        assert!(matches!(
            exchange.buy(&mut host, anyone, &MembershipProof::empty(), 0),
            Err(CurveSaleError::Paused)
        ));
        assert!(matches!(
            exchange.sell(&mut host, anyone, 0),
            Err(CurveSaleError::Paused)
        ));
    }

    #[test]
    fn withdraw_empty_reserve_fails() {
        let (mut host, mut exchange, owner) = setup();
        assert!(matches!(
            exchange.withdraw(&mut host, owner),
            Err(CurveSaleError::NothingToWithdraw)
        ));
        assert!(exchange.events().is_empty());
    }

    #[test]
    fn withdraw_drains_reserve_to_owner_even_when_paused() {
        let (mut host, mut exchange, owner) = setup();
        let buyer = Address::derive("buyer");
        host.mint_native(&buyer, ONE).unwrap();
        exchange
            .buy(&mut host, buyer, &MembershipProof::empty(), ONE)
            .unwrap();
        let reserve = exchange.reserve_balance(&host);
        exchange.pause(owner).unwrap();

        assert!(matches!(
            exchange.withdraw(&mut host, buyer),
            Err(CurveSaleError::NotOwner { .. })
        ));
        assert_eq!(exchange.withdraw(&mut host, owner).unwrap(), reserve);
        assert_eq!(exchange.reserve_balance(&host), 0);
        assert_eq!(host.native_balance(&owner), reserve);
    }

    #[test]
    fn ownership_moves_and_old_owner_loses_access() {
        let (_, mut exchange, owner) = setup();
        let next = Address::derive("next-owner");
        assert!(matches!(
            exchange.transfer_ownership(owner, Address::ZERO),
            Err(CurveSaleError::ZeroOwner)
        ));
        exchange.transfer_ownership(owner, next).unwrap();
        assert_eq!(exchange.principal(), next);
        assert!(exchange.pause(owner).is_err());
        exchange.pause(next).unwrap();
    }
}
