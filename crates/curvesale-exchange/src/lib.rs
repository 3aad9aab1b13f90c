//! # curvesale-exchange
//!
//! **ExchangeController** and **AdminSurface**: a sale that sells units off a
//! linear bonding curve against a pooled value reserve.
//!
//! ## Execution Model
//!
//! ```text
//! caller ──buy/sell──► Exchange ──► AdmissionController (buy only)
//!                         │    └──► PricingEngine
//!                         ├──► ValueLedger   (units out / pulled back)
//!                         └──► Host::send_value (refund / payout ──► recipient hook)
//! ```
//!
//! - **Atomic**: each entry point either completes or leaves no trace.
//! - **Non-reentrant**: a recipient hook that calls back into a guarded
//!   entry point gets [`CurveSaleError::Reentrant`](curvesale_types::CurveSaleError::Reentrant).
//! - **Derived state**: units sold and the reserve are read from balances.
//! - **Pausable**: while paused, buy and sell fail before any other check.
//!
//! ## Components
//!
//! - [`ValueLedger`]: the external token ledger contract
//! - [`Host`]: native value, clock, hooks, checkpoints
//! - [`Recipient`]: what a hook may do, acting only as the recipient
//! - [`ReentrancyGuard`]: scoped lock
//! - [`Exchange`]: trading, views and owner controls
//! - `MemoryLedger` (feature `test-helpers`): in-memory [`ValueLedger`]

pub mod admin;
pub mod exchange;
pub mod guard;
pub mod host;
pub mod ledger;

pub use exchange::{BuyReceipt, Exchange, SellReceipt};
pub use guard::{ReentrancyGuard, ReentrancyToken};
pub use host::{Host, HostCheckpoint, Recipient, ValueReceiver};
pub use ledger::ValueLedger;

#[cfg(any(test, feature = "test-helpers"))]
pub use ledger::MemoryLedger;
