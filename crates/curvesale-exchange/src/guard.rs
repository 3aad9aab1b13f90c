//! Scoped non-reentrancy lock.
//!
//! The lock flag is shared (`Rc<Cell<bool>>`) so a held token does not
//! borrow the exchange: the exchange must stay mutably reachable while
//! outgoing value transfers run recipient hooks, and any guarded call those
//! hooks make has to observe the flag and fail.

use std::{cell::Cell, rc::Rc};

use curvesale_types::{CurveSaleError, Result};
use tracing::warn;

/// Non-reentrancy lock for the exchange's mutating entry points.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    locked: Rc<Cell<bool>>,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Take the lock, or fail with [`CurveSaleError::Reentrant`] if a
    /// guarded call is already in progress.
    pub fn enter(&self) -> Result<ReentrancyToken> {
        if self.locked.replace(true) {
            warn!("Reentrant call rejected");
            return Err(CurveSaleError::Reentrant);
        }
        Ok(ReentrancyToken {
            locked: Rc::clone(&self.locked),
        })
    }
}

/// Proof of holding the lock. Releases it on drop, on every exit path.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the token is dropped"]
pub struct ReentrancyToken {
    locked: Rc<Cell<bool>>,
}

impl Drop for ReentrancyToken {
    fn drop(&mut self) {
        self.locked.set(false);
    }
}
