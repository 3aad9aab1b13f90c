//! Time-phased buy gate.

use chrono::{DateTime, Utc};
use curvesale_types::{Address, CurveSaleError, Digest, Result, SaleConfig, SalePhase};
use tracing::debug;

use crate::membership::MembershipProof;

/// Admits or rejects buyers by phase and, while restricted, by membership.
///
/// Holds only the immutable sale thresholds and root; the phase itself is
/// recomputed from the supplied clock on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionController {
    restricted_start: DateTime<Utc>,
    open_start: DateTime<Utc>,
    membership_root: Digest,
}

impl AdmissionController {
    pub fn new(
        restricted_start: DateTime<Utc>,
        open_start: DateTime<Utc>,
        membership_root: Digest,
    ) -> Result<Self> {
        if restricted_start >= open_start {
            return Err(CurveSaleError::InvertedPhases);
        }
        Ok(Self {
            restricted_start,
            open_start,
            membership_root,
        })
    }

    pub fn from_config(config: &SaleConfig) -> Result<Self> {
        Self::new(
            config.restricted_start,
            config.open_start,
            config.membership_root,
        )
    }

    #[must_use]
    pub fn restricted_start(&self) -> DateTime<Utc> {
        self.restricted_start
    }

    #[must_use]
    pub fn open_start(&self) -> DateTime<Utc> {
        self.open_start
    }

    #[must_use]
    pub fn membership_root(&self) -> Digest {
        self.membership_root
    }

    #[must_use]
    pub fn phase_at(&self, now: DateTime<Utc>) -> SalePhase {
        SalePhase::at(now, self.restricted_start, self.open_start)
    }

    /// Gate a buy by `caller` at `now`.
    ///
    /// CLOSED always fails with `NotStarted`. RESTRICTED requires `proof` to
    /// place `caller` under the membership root. OPEN ignores the proof.
    /// Returns the phase the buy was admitted under.
    pub fn check_buy(
        &self,
        now: DateTime<Utc>,
        caller: &Address,
        proof: &MembershipProof,
    ) -> Result<SalePhase> {
        let phase = self.phase_at(now);
        match phase {
            SalePhase::Closed => {
                debug!(%caller, "Buy rejected: sale not started");
                Err(CurveSaleError::NotStarted)
            }
            SalePhase::Restricted => {
                if proof.verify_member(&self.membership_root, caller) {
                    debug!(%caller, proof_len = proof.len(), "Restricted buy admitted");
                    Ok(phase)
                } else {
                    debug!(%caller, "Buy rejected: not in allow-set");
                    Err(CurveSaleError::NotEligible {
                        caller: *caller,
                        phase,
                    })
                }
            }
            SalePhase::Open => Ok(phase),
        }
    }
}
