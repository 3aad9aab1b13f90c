//! Sale phases.
//!
//! The phase is never stored: it is derived from the current time against
//! the two configured thresholds, so transitions are monotonic and there is
//! no rollback. **CLOSED → RESTRICTED → OPEN**

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three phases of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SalePhase {
    /// Before the restricted start: every buy fails.
    Closed,
    /// Only members of the committed allow-set may buy.
    Restricted,
    /// Anyone may buy.
    Open,
}

impl SalePhase {
    /// Derive the phase at `now` from the two thresholds.
    ///
    /// `restricted_start` is inclusive for RESTRICTED, `open_start` is
    /// inclusive for OPEN.
    #[must_use]
    pub fn at(
        now: DateTime<Utc>,
        restricted_start: DateTime<Utc>,
        open_start: DateTime<Utc>,
    ) -> Self {
        if now < restricted_start {
            Self::Closed
        } else if now < open_start {
            Self::Restricted
        } else {
            Self::Open
        }
    }
}

impl fmt::Display for SalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Restricted => write!(f, "RESTRICTED"),
            Self::Open => write!(f, "OPEN"),
        }
    }
}
