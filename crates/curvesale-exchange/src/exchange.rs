//! The exchange controller: buy and sell against the curve.
//!
//! Units sold and the value reserve are never stored. Both are read from the
//! host on demand: units sold from the exchange's own ledger balance, the
//! reserve from its native value balance.
//!
//! Every mutating entry point runs inside [`Exchange::atomically`]: on any
//! error the host balances, the ledger, and the exchange's own state and
//! event log are restored to what they were when the call began.

use curvesale_admission::{AdmissionController, MembershipProof};
use curvesale_pricing::{BuyQuote, PricingEngine};
use curvesale_types::{
    Address, CurveSaleError, Result, SaleConfig, SaleEvent, SalePhase,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    guard::ReentrancyGuard,
    host::Host,
    ledger::ValueLedger,
};

/// What a successful buy did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub buyer: Address,
    /// Phase the buy was admitted under.
    pub phase: SalePhase,
    pub quantity: u128,
    /// Value kept by the exchange.
    pub cost: u128,
    /// Value returned to the buyer.
    pub refund: u128,
}

/// What a successful sell did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellReceipt {
    pub seller: Address,
    pub quantity: u128,
    pub payout: u128,
}

/// Exchange state restored when a call fails.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    paused: bool,
    principal: Address,
    events: usize,
}

/// A deployed sale.
#[derive(Debug)]
pub struct Exchange {
    pub(crate) config: SaleConfig,
    pub(crate) pricing: PricingEngine,
    pub(crate) admission: AdmissionController,
    pub(crate) principal: Address,
    pub(crate) address: Address,
    pub(crate) paused: bool,
    pub(crate) guard: ReentrancyGuard,
    pub(crate) events: Vec<SaleEvent>,
}

impl Exchange {
    /// Deploy a sale owned by `principal` at `address`.
    ///
    /// The exchange holds no units yet; the supplier funds `address` on the
    /// ledger with `initial_supply × unit_size` base units before trading.
    pub fn deploy(config: SaleConfig, principal: Address, address: Address) -> Result<Self> {
        config.validate()?;
        if principal.is_zero() {
            return Err(CurveSaleError::ZeroOwner);
        }
        if address.is_zero() {
            return Err(CurveSaleError::InvalidConfig {
                reason: "exchange address must be non-zero".into(),
            });
        }
        let pricing = PricingEngine::from_config(&config)?;
        let admission = AdmissionController::from_config(&config)?;

        info!(
            %address,
            %principal,
            supply = config.initial_supply,
            initial_price = config.initial_price,
            increment = config.price_increment,
            "Exchange deployed"
        );

        Ok(Self {
            config,
            pricing,
            admission,
            principal,
            address,
            paused: false,
            guard: ReentrancyGuard::new(),
            events: Vec::new(),
        })
    }

    // =================================================================
    // Views
    // =================================================================

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn principal(&self) -> Address {
        self.principal
    }

    #[must_use]
    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    #[must_use]
    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn events(&self) -> &[SaleEvent] {
        &self.events
    }

    /// Drain the event log. Refused while a call is in flight, since that
    /// call may still be rolled back.
    pub fn take_events(&mut self) -> Result<Vec<SaleEvent>> {
        if self.guard.is_locked() {
            warn!("Event drain rejected during a call");
            return Err(CurveSaleError::Reentrant);
        }
        Ok(std::mem::take(&mut self.events))
    }

    /// `initial_supply − whole units held`. Holding more than the initial
    /// supply is an underflow and fails.
    pub fn units_sold<L: ValueLedger>(&self, host: &Host<L>) -> Result<u128> {
        self.config
            .initial_supply
            .checked_sub(self.units_held(host))
            .ok_or(CurveSaleError::overflow("units_sold"))
    }

    /// Whole units still purchasable.
    pub fn available_units<L: ValueLedger>(&self, host: &Host<L>) -> Result<u128> {
        self.pricing.remaining(self.units_sold(host)?)
    }

    pub fn reserve_balance<L: ValueLedger>(&self, host: &Host<L>) -> u128 {
        host.native_balance(&self.address)
    }

    pub fn current_price<L: ValueLedger>(&self, host: &Host<L>) -> Result<u128> {
        self.pricing.current_price(self.units_sold(host)?)
    }

    pub fn phase<L: ValueLedger>(&self, host: &Host<L>) -> SalePhase {
        self.admission.phase_at(host.now())
    }

    /// What `payment` would buy right now, ignoring admission.
    pub fn quote_buy<L: ValueLedger>(&self, host: &Host<L>, payment: u128) -> Result<BuyQuote> {
        self.pricing.quote_buy(self.units_sold(host)?, payment)
    }

    /// What selling `quantity` units would pay out right now.
    pub fn quote_sell<L: ValueLedger>(&self, host: &Host<L>, quantity: u128) -> Result<u128> {
        self.pricing
            .payout_for_quantity(self.units_sold(host)?, quantity)
    }

    fn units_held<L: ValueLedger>(&self, host: &Host<L>) -> u128 {
        host.ledger().balance_of(&self.address) / self.config.unit_size
    }

    fn base_amount(&self, quantity: u128) -> Result<u128> {
        quantity
            .checked_mul(self.config.unit_size)
            .ok_or(CurveSaleError::overflow("base_amount"))
    }

    // =================================================================
    // Trading
    // =================================================================

    /// Buy as many units as `payment` affords; the remainder is refunded.
    ///
    /// `payment` is the value attached to the call, taken from `caller`'s
    /// native balance.
    pub fn buy<L: ValueLedger + Clone>(
        &mut self,
        host: &mut Host<L>,
        caller: Address,
        proof: &MembershipProof,
        payment: u128,
    ) -> Result<BuyReceipt> {
        self.atomically(host, |ex, host| ex.execute_buy(host, caller, proof, payment))
    }

    fn execute_buy<L: ValueLedger + Clone>(
        &mut self,
        host: &mut Host<L>,
        caller: Address,
        proof: &MembershipProof,
        payment: u128,
    ) -> Result<BuyReceipt> {
        if self.paused {
            return Err(CurveSaleError::Paused);
        }
        let _token = self.guard.enter()?;
        if payment == 0 {
            return Err(CurveSaleError::ZeroPayment);
        }
        let phase = self.admission.check_buy(host.now(), &caller, proof)?;

        let sold = self.units_sold(host)?;
        let available = self.pricing.remaining(sold)?;
        if available == 0 {
            return Err(CurveSaleError::InsufficientSupply {
                requested: 1,
                available,
            });
        }
        let price = self.pricing.current_price(sold)?;
        if payment < price {
            return Err(CurveSaleError::PaymentBelowPrice { payment, price });
        }
        let quote = self.pricing.quote_buy(sold, payment)?;
        if quote.quantity == 0 || quote.quantity > available {
            return Err(CurveSaleError::InsufficientSupply {
                requested: quote.quantity,
                available,
            });
        }

        let exchange = self.address;
        host.move_value(&caller, &exchange, payment)?;
        let amount = self.base_amount(quote.quantity)?;
        host.ledger_mut().transfer(&exchange, &caller, amount)?;

        self.emit(SaleEvent::Purchase {
            buyer: caller,
            value_paid: quote.cost,
            quantity: quote.quantity,
        });

        if quote.refund > 0 {
            host.send_value(self, &exchange, &caller, quote.refund)?;
        }

        info!(
            buyer = %caller,
            %phase,
            quantity = quote.quantity,
            cost = quote.cost,
            refund = quote.refund,
            "Buy executed"
        );

        Ok(BuyReceipt {
            buyer: caller,
            phase,
            quantity: quote.quantity,
            cost: quote.cost,
            refund: quote.refund,
        })
    }

    /// Return `quantity` units for the value they cost on the way up.
    ///
    /// The caller must have approved the exchange for `quantity × unit_size`
    /// base units on the ledger. Selling is not gated by phase.
    pub fn sell<L: ValueLedger + Clone>(
        &mut self,
        host: &mut Host<L>,
        caller: Address,
        quantity: u128,
    ) -> Result<SellReceipt> {
        self.atomically(host, |ex, host| ex.execute_sell(host, caller, quantity))
    }

    fn execute_sell<L: ValueLedger + Clone>(
        &mut self,
        host: &mut Host<L>,
        caller: Address,
        quantity: u128,
    ) -> Result<SellReceipt> {
        if self.paused {
            return Err(CurveSaleError::Paused);
        }
        let _token = self.guard.enter()?;
        if quantity == 0 {
            return Err(CurveSaleError::ZeroQuantity);
        }

        let sold = self.units_sold(host)?;
        let payout = self.pricing.payout_for_quantity(sold, quantity)?;
        let reserve = self.reserve_balance(host);
        if payout > reserve {
            return Err(CurveSaleError::InsufficientReserve {
                needed: payout,
                available: reserve,
            });
        }

        let exchange = self.address;
        let amount = self.base_amount(quantity)?;
        host.ledger_mut()
            .transfer_from(&exchange, &caller, &exchange, amount)?;

        self.emit(SaleEvent::Sale {
            seller: caller,
            quantity,
            value_paid: payout,
        });

        host.send_value(self, &exchange, &caller, payout)?;

        info!(seller = %caller, quantity, payout, "Sell executed");

        Ok(SellReceipt {
            seller: caller,
            quantity,
            payout,
        })
    }

    /// Entry point for value sent to the exchange outside of `buy`. Always
    /// rejects.
    pub fn receive_value(&self, from: Address, amount: u128) -> Result<()> {
        warn!(%from, amount, "Unsolicited transfer rejected");
        Err(CurveSaleError::UnsolicitedTransfer { from, amount })
    }

    // =================================================================
    // Internals
    // =================================================================

    /// Run `op`; if it fails, undo everything it did.
    pub(crate) fn atomically<L, T, F>(&mut self, host: &mut Host<L>, op: F) -> Result<T>
    where
        L: ValueLedger + Clone,
        F: FnOnce(&mut Self, &mut Host<L>) -> Result<T>,
    {
        let checkpoint = host.checkpoint();
        let snapshot = self.snapshot();
        let outcome = op(self, host);
        if outcome.is_err() {
            host.rollback(checkpoint);
            self.restore(snapshot);
        }
        outcome
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            paused: self.paused,
            principal: self.principal,
            events: self.events.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.paused = snapshot.paused;
        self.principal = snapshot.principal;
        self.events.truncate(snapshot.events);
    }

    pub(crate) fn emit(&mut self, event: SaleEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use curvesale_types::Digest;

    use super::*;
    use crate::ledger::MemoryLedger;

    const ONE: u128 = 1_000_000_000_000_000_000;

    struct Fixture {
        host: Host<MemoryLedger>,
        exchange: Exchange,
        buyer: Address,
    }

    /// Sample sale, open phase, buyer holding 10 value units.
    fn fixture() -> Fixture {
        let config = SaleConfig::sample();
        let owner = Address::derive("owner");
        let address = Address::derive("exchange");
        let buyer = Address::derive("buyer");

        let mut ledger = MemoryLedger::new();
        ledger
            .mint(&address, config.total_base_supply().unwrap())
            .unwrap();
        let mut host = Host::new(ledger, config.open_start + Duration::hours(1));
        host.mint_native(&buyer, 10 * ONE).unwrap();

        let exchange = Exchange::deploy(config, owner, address).unwrap();
        Fixture {
            host,
            exchange,
            buyer,
        }
    }

    #[test]
    fn deploy_rejects_zero_owner_and_address() {
        let config = SaleConfig::sample();
        assert!(matches!(
            Exchange::deploy(config.clone(), Address::ZERO, Address::derive("x")),
            Err(CurveSaleError::ZeroOwner)
        ));
        assert!(Exchange::deploy(config, Address::derive("o"), Address::ZERO).is_err());
    }

    #[test]
    fn fresh_sale_views() {
        let f = fixture();
        assert_eq!(f.exchange.units_sold(&f.host).unwrap(), 0);
        assert_eq!(f.exchange.available_units(&f.host).unwrap(), 1_000_000);
        assert_eq!(f.exchange.reserve_balance(&f.host), 0);
        assert_eq!(f.exchange.current_price(&f.host).unwrap(), ONE / 1000);
        assert_eq!(f.exchange.phase(&f.host), SalePhase::Open);
        assert!(!f.exchange.is_paused());
    }

    #[test]
    fn buy_moves_units_value_and_refund() {
        let mut f = fixture();
        let receipt = f
            .exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::empty(), ONE)
            .unwrap();
        assert_eq!(receipt.quantity, 132);
        assert_eq!(receipt.cost, 996_600_000_000_000_000);
        assert_eq!(receipt.refund, ONE - receipt.cost);

        assert_eq!(f.exchange.units_sold(&f.host).unwrap(), 132);
        assert_eq!(f.exchange.reserve_balance(&f.host), receipt.cost);
        assert_eq!(f.host.native_balance(&f.buyer), 10 * ONE - receipt.cost);
        assert_eq!(f.host.ledger().balance_of(&f.buyer), 132 * ONE);
        assert_eq!(
            f.exchange.events(),
            &[SaleEvent::Purchase {
                buyer: f.buyer,
                value_paid: receipt.cost,
                quantity: 132
            }]
        );
    }

    #[test]
    fn zero_and_dust_payments_rejected() {
        let mut f = fixture();
        let proof = MembershipProof::empty();
        assert!(matches!(
            f.exchange.buy(&mut f.host, f.buyer, &proof, 0),
            Err(CurveSaleError::ZeroPayment)
        ));
        assert!(matches!(
            f.exchange.buy(&mut f.host, f.buyer, &proof, ONE / 1000 - 1),
            Err(CurveSaleError::PaymentBelowPrice { .. })
        ));
        assert!(f.exchange.events().is_empty());
        assert_eq!(f.host.native_balance(&f.buyer), 10 * ONE);
    }

    #[test]
    fn payment_beyond_funds_rejected() {
        let mut f = fixture();
        let err = f
            .exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::empty(), 11 * ONE)
            .unwrap_err();
        assert!(matches!(err, CurveSaleError::InsufficientFunds { .. }));
        assert_eq!(f.exchange.units_sold(&f.host).unwrap(), 0);
    }

    #[test]
    fn sell_returns_what_was_paid() {
        let mut f = fixture();
        let bought = f
            .exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::empty(), ONE)
            .unwrap();
        let address = f.exchange.address();
        f.host
            .ledger_mut()
            .approve(&f.buyer, &address, bought.quantity * ONE);

        let sold = f.exchange.sell(&mut f.host, f.buyer, bought.quantity).unwrap();
        assert_eq!(sold.payout, bought.cost);
        assert_eq!(f.exchange.units_sold(&f.host).unwrap(), 0);
        assert_eq!(f.exchange.reserve_balance(&f.host), 0);
        assert_eq!(f.host.native_balance(&f.buyer), 10 * ONE);
    }

    #[test]
    fn sell_without_allowance_unwinds() {
        let mut f = fixture();
        f.exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::empty(), ONE)
            .unwrap();
        let reserve = f.exchange.reserve_balance(&f.host);

        let err = f.exchange.sell(&mut f.host, f.buyer, 10).unwrap_err();
        assert!(matches!(err, CurveSaleError::InsufficientAllowance { .. }));
        assert_eq!(f.exchange.reserve_balance(&f.host), reserve);
        assert_eq!(f.exchange.units_sold(&f.host).unwrap(), 132);
        assert_eq!(f.exchange.events().len(), 1);
    }

    #[test]
    fn sell_zero_and_oversell_rejected() {
        let mut f = fixture();
        assert!(matches!(
            f.exchange.sell(&mut f.host, f.buyer, 0),
            Err(CurveSaleError::ZeroQuantity)
        ));
        assert!(matches!(
            f.exchange.sell(&mut f.host, f.buyer, 1),
            Err(CurveSaleError::InsufficientUnitsSold { requested: 1, sold: 0 })
        ));
    }

    #[test]
    fn unsolicited_value_rejected() {
        let mut f = fixture();
        let address = f.exchange.address();
        let err = f
            .host
            .send_value(&mut f.exchange, &f.buyer, &address, ONE)
            .unwrap_err();
        assert!(matches!(err, CurveSaleError::UnsolicitedTransfer { amount, .. } if amount == ONE));
        assert_eq!(f.exchange.reserve_balance(&f.host), 0);
        assert_eq!(f.host.native_balance(&f.buyer), 10 * ONE);
    }

    #[test]
    fn restricted_phase_requires_membership() {
        let mut f = fixture();
        f.host.set_time(f.exchange.config().restricted_start);
        let err = f
            .exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::new(vec![Digest::ZERO]), ONE)
            .unwrap_err();
        assert!(matches!(err, CurveSaleError::NotEligible { .. }));
        assert_eq!(f.host.native_balance(&f.buyer), 10 * ONE);
    }

    #[test]
    fn holdings_above_supply_halt_trading() {
        let mut f = fixture();
        f.exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::empty(), ONE)
            .unwrap();
        let address = f.exchange.address();
        f.host.ledger_mut().approve(&f.buyer, &address, 132 * ONE);
        f.host.ledger_mut().mint(&address, 200 * ONE).unwrap();

        let overflow = |r: Result<u128>| {
            matches!(r, Err(CurveSaleError::ArithmeticOverflow { op: "units_sold" }))
        };
        assert!(overflow(f.exchange.units_sold(&f.host)));
        assert!(overflow(f.exchange.available_units(&f.host)));
        assert!(overflow(f.exchange.current_price(&f.host)));
        assert!(overflow(f.exchange.quote_sell(&f.host, 1)));
        assert!(matches!(
            f.exchange.quote_buy(&f.host, ONE),
            Err(CurveSaleError::ArithmeticOverflow { .. })
        ));

        let reserve = f.exchange.reserve_balance(&f.host);
        let native = f.host.native_balance(&f.buyer);
        let held = f.host.ledger().balance_of(&f.buyer);
        assert!(matches!(
            f.exchange.buy(&mut f.host, f.buyer, &MembershipProof::empty(), ONE),
            Err(CurveSaleError::ArithmeticOverflow { .. })
        ));
        assert!(matches!(
            f.exchange.sell(&mut f.host, f.buyer, 132),
            Err(CurveSaleError::ArithmeticOverflow { .. })
        ));
        assert_eq!(f.exchange.reserve_balance(&f.host), reserve);
        assert_eq!(f.host.native_balance(&f.buyer), native);
        assert_eq!(f.host.ledger().balance_of(&f.buyer), held);
        assert_eq!(f.exchange.events().len(), 1);
    }

    #[test]
    fn events_drain_outside_calls() {
        let mut f = fixture();
        f.exchange
            .buy(&mut f.host, f.buyer, &MembershipProof::empty(), ONE)
            .unwrap();
        assert_eq!(f.exchange.take_events().unwrap().len(), 1);
        assert!(f.exchange.events().is_empty());

        let _token = f.exchange.guard.enter().unwrap();
        assert!(matches!(f.exchange.take_events(), Err(CurveSaleError::Reentrant)));
    }
}
