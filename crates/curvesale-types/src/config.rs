//! Sale configuration.
//!
//! A [`SaleConfig`] is fixed at deployment and never changes afterwards.
//! It is loaded from JSON; prices are written as decimal value strings
//! (`"0.001"`) and stored internally as base units.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, CurveSaleError, Digest, Result, constants};

/// Serde adapter: `u128` base units <-> decimal value string.
mod as_value {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::units;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        let decimal = units::format_value(*value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&decimal.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        units::parse_value_str(&s).map_err(serde::de::Error::custom)
    }
}

fn default_unit_size() -> u128 {
    constants::DEFAULT_UNIT_SIZE
}

/// Immutable parameters of a curve sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Ledger holding the tradeable unit.
    pub reserve_unit: Address,
    /// Whole units tradeable through the curve. Must be > 0.
    pub initial_supply: u128,
    /// Ledger base units per whole tradeable unit.
    #[serde(default = "default_unit_size")]
    pub unit_size: u128,
    /// Start of the allow-listed phase (inclusive).
    pub restricted_start: DateTime<Utc>,
    /// Start of the open phase (inclusive). Must be after `restricted_start`.
    pub open_start: DateTime<Utc>,
    /// Root of the allow-list membership tree.
    pub membership_root: Digest,
    /// Price of the first unit, in value base units.
    #[serde(with = "as_value")]
    pub initial_price: u128,
    /// Price increase per unit sold, in value base units.
    #[serde(with = "as_value")]
    pub price_increment: u128,
}

impl SaleConfig {
    /// Check every construction-time invariant.
    pub fn validate(&self) -> Result<()> {
        if self.reserve_unit.is_zero() {
            return Err(CurveSaleError::InvalidConfig {
                reason: "reserve unit must not be the zero address".into(),
            });
        }
        if self.initial_supply == 0 {
            return Err(CurveSaleError::InvalidConfig {
                reason: "initial supply must be > 0".into(),
            });
        }
        if self.unit_size == 0 {
            return Err(CurveSaleError::InvalidConfig {
                reason: "unit size must be > 0".into(),
            });
        }
        if self.initial_supply.checked_mul(self.unit_size).is_none() {
            return Err(CurveSaleError::InvalidConfig {
                reason: format!(
                    "initial supply {} x unit size {} overflows",
                    self.initial_supply, self.unit_size
                ),
            });
        }
        if self.initial_price == 0 || self.price_increment == 0 {
            return Err(CurveSaleError::InvalidConfig {
                reason: "initial price and price increment must be > 0".into(),
            });
        }
        if self.restricted_start >= self.open_start {
            return Err(CurveSaleError::InvertedPhases);
        }
        Ok(())
    }

    /// Ledger base units the exchange must hold at deployment.
    pub fn total_base_supply(&self) -> Result<u128> {
        self.initial_supply
            .checked_mul(self.unit_size)
            .ok_or(CurveSaleError::overflow("total_base_supply"))
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reference configuration for tests: 0.001 start price, 0.0001 increment,
/// one million 18-decimal units, restricted phase one day before open.
#[cfg(any(test, feature = "test-helpers"))]
impl SaleConfig {
    pub fn sample() -> Self {
        let restricted_start = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        Self {
            reserve_unit: Address::derive("ledger"),
            initial_supply: 1_000_000,
            unit_size: constants::DEFAULT_UNIT_SIZE,
            restricted_start,
            open_start: restricted_start + chrono::Duration::days(1),
            membership_root: Digest::ZERO,
            initial_price: 1_000_000_000_000_000,
            price_increment: 100_000_000_000_000,
        }
    }
}
