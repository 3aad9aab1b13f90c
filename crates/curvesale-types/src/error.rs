//! Error types for the CurveSale engine.
//!
//! All errors use the `CS_ERR_` prefix convention for easy grepping in logs.
//! Every error aborts the whole call it occurred in; nothing is retried.
//! Error codes are grouped by subsystem:
//! - 1xx: Configuration errors
//! - 2xx: Admission errors
//! - 3xx: Input errors
//! - 4xx: Resource errors
//! - 5xx: Transfer errors
//! - 6xx: Access errors
//! - 7xx: Guarded-state errors
//! - 8xx: Unsolicited-transfer errors
//! - 9xx: Arithmetic / general / internal errors

use thiserror::Error;

use crate::{Address, SalePhase};

/// Central error enum for all CurveSale operations.
#[derive(Debug, Error)]
pub enum CurveSaleError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// The sale configuration failed validation.
    #[error("CS_ERR_100: Invalid sale configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Phase thresholds are not strictly increasing.
    #[error("CS_ERR_101: Inverted phase thresholds: restricted start must precede open start")]
    InvertedPhases,

    /// An address or digest could not be parsed.
    #[error("CS_ERR_102: Invalid identifier: {reason}")]
    InvalidIdentifier { reason: String },

    // =================================================================
    // Admission Errors (2xx)
    // =================================================================
    /// The sale has not reached its restricted phase yet.
    #[error("CS_ERR_200: Sale not started")]
    NotStarted,

    /// Restricted phase: the caller's membership proof did not verify.
    #[error("CS_ERR_201: Caller {caller} is not eligible during {phase}")]
    NotEligible { caller: Address, phase: SalePhase },

    // =================================================================
    // Input Errors (3xx)
    // =================================================================
    /// A buy was attempted with no attached value.
    #[error("CS_ERR_300: Payment must be greater than zero")]
    ZeroPayment,

    /// A sell was attempted for zero units.
    #[error("CS_ERR_301: Quantity must be greater than zero")]
    ZeroQuantity,

    /// The payment does not cover a single unit at the current price.
    #[error("CS_ERR_302: Payment {payment} is below the current unit price {price}")]
    PaymentBelowPrice { payment: u128, price: u128 },

    // =================================================================
    // Resource Errors (4xx)
    // =================================================================
    /// Not enough tradeable units left in the exchange.
    #[error("CS_ERR_400: Insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply { requested: u128, available: u128 },

    /// The value reserve cannot cover a payout.
    #[error("CS_ERR_401: Insufficient reserve: need {needed}, have {available}")]
    InsufficientReserve { needed: u128, available: u128 },

    /// Withdrawal requested while the reserve is empty.
    #[error("CS_ERR_402: No value to withdraw")]
    NothingToWithdraw,

    /// More units offered back than the curve has sold.
    #[error("CS_ERR_403: Cannot sell {requested} units, only {sold} sold")]
    InsufficientUnitsSold { requested: u128, sold: u128 },

    /// The caller does not hold enough native value for the attached amount.
    #[error("CS_ERR_404: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    // =================================================================
    // Transfer Errors (5xx)
    // =================================================================
    /// A native value transfer to a recipient failed (hook rejected or errored).
    #[error("CS_ERR_500: Value transfer to {to} failed: {reason}")]
    ValueTransferFailed { to: Address, reason: String },

    /// The tradeable-unit ledger refused a transfer.
    #[error("CS_ERR_501: Ledger transfer failed: {reason}")]
    LedgerTransferFailed { reason: String },

    /// Allowance-based pull exceeded the approved amount.
    #[error("CS_ERR_502: Insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: u128, approved: u128 },

    /// Ledger balance too small for the requested transfer.
    #[error("CS_ERR_503: Insufficient ledger balance: need {needed}, have {available}")]
    InsufficientLedgerBalance { needed: u128, available: u128 },

    // =================================================================
    // Access Errors (6xx)
    // =================================================================
    /// An owner-only entry point was called by someone else.
    #[error("CS_ERR_600: Caller {caller} is not the owner")]
    NotOwner { caller: Address },

    /// Ownership cannot be handed to the zero address.
    #[error("CS_ERR_601: New owner must not be the zero address")]
    ZeroOwner,

    // =================================================================
    // Guarded-State Errors (7xx)
    // =================================================================
    /// Trading is halted.
    #[error("CS_ERR_700: Sale is paused")]
    Paused,

    /// A guarded entry point was re-entered while a call was in progress.
    #[error("CS_ERR_701: Reentrant call rejected")]
    Reentrant,

    /// `pause` called while already paused.
    #[error("CS_ERR_702: Sale is already paused")]
    AlreadyPaused,

    /// `unpause` called while not paused.
    #[error("CS_ERR_703: Sale is not paused")]
    NotPaused,

    // =================================================================
    // Unsolicited-Transfer Errors (8xx)
    // =================================================================
    /// Value was sent to the exchange outside of `buy`.
    #[error("CS_ERR_800: Unsolicited transfer of {amount} from {from} rejected")]
    UnsolicitedTransfer { from: Address, amount: u128 },

    // =================================================================
    // Arithmetic / General (9xx)
    // =================================================================
    /// Checked arithmetic overflowed or underflowed.
    #[error("CS_ERR_900: Arithmetic overflow in {op}")]
    ArithmeticOverflow { op: &'static str },

    /// Serialization / deserialization error.
    #[error("CS_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (reading configuration files).
    #[error("CS_ERR_903: I/O error: {0}")]
    Io(String),
}

impl CurveSaleError {
    /// Shorthand for [`CurveSaleError::ArithmeticOverflow`].
    #[must_use]
    pub fn overflow(op: &'static str) -> Self {
        Self::ArithmeticOverflow { op }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CurveSaleError>;

impl From<std::io::Error> for CurveSaleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CurveSaleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
