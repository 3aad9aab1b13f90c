//! # curvesale-types
//!
//! Shared types, errors, and configuration for the **CurveSale** engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`Digest`]
//! - **Sale model**: [`SaleConfig`], [`SalePhase`]
//! - **Events**: [`SaleEvent`]
//! - **Errors**: [`CurveSaleError`] with `CS_ERR_` prefix codes
//! - **Units**: human-decimal conversion of value amounts ([`units`])
//! - **Constants**: defaults and fixed-point scales

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod phase;
pub mod units;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use phase::*;

// Constants and unit helpers are accessed via their module path
// (`curvesale_types::constants::FOO`, `curvesale_types::units::parse_value`).
