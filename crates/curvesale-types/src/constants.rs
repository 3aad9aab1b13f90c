//! System-wide constants for the CurveSale engine.

/// Decimal places of the native value unit (1 value unit = 10^18 base units).
pub const VALUE_DECIMALS: u32 = 18;

/// Default ledger base units per whole tradeable unit (18-decimal ledger).
pub const DEFAULT_UNIT_SIZE: u128 = 1_000_000_000_000_000_000;

/// Byte length of an [`crate::Address`].
pub const ADDRESS_LEN: usize = 20;

/// Byte length of a [`crate::Digest`].
pub const DIGEST_LEN: usize = 32;
