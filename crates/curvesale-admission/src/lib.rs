//! # curvesale-admission
//!
//! Decides who may buy, and when.
//!
//! ## Phases
//!
//! ```text
//! now < restricted_start               → CLOSED      (every buy fails)
//! restricted_start ≤ now < open_start  → RESTRICTED  (membership proof required)
//! now ≥ open_start                     → OPEN        (proof ignored)
//! ```
//!
//! ## Membership
//!
//! The allow-set is committed as a single root digest. A caller proves
//! membership with the sibling digests on the path from their leaf to the
//! root; each step hashes the smaller digest first, so proofs carry no
//! left/right flags.
//!
//! ## Components
//!
//! - [`MembershipProof`]: stateless proof verification
//! - [`AdmissionController`]: the per-buy phase gate
//! - `MembershipTree` (feature `test-helpers`): builds roots and proofs

pub mod gate;
pub mod membership;

pub use gate::AdmissionController;
pub use membership::{MembershipProof, hash_pair, leaf_digest, verify};

#[cfg(any(test, feature = "test-helpers"))]
pub use membership::MembershipTree;
