//! Sorted-pair membership proofs over SHA-256.

use curvesale_types::{Address, Digest, constants::DIGEST_LEN};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Leaf digest for an address: `SHA-256(address bytes)`.
#[must_use]
pub fn leaf_digest(address: &Address) -> Digest {
    Digest::of(address.as_bytes())
}

/// Parent of two nodes. The lexicographically smaller digest is hashed first,
/// so `hash_pair(a, b) == hash_pair(b, a)`.
#[must_use]
pub fn hash_pair(a: &Digest, b: &Digest) -> Digest {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(&hasher.finalize());
    Digest::from_bytes(bytes)
}

/// Fold `leaf` through every proof element and compare with `root`.
#[must_use]
pub fn verify(proof: &MembershipProof, root: &Digest, leaf: &Digest) -> bool {
    let computed = proof
        .0
        .iter()
        .fold(*leaf, |node, sibling| hash_pair(&node, sibling));
    computed == *root
}

/// Sibling digests from a leaf up to (excluding) the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipProof(pub Vec<Digest>);

impl MembershipProof {
    #[must_use]
    pub fn new(siblings: Vec<Digest>) -> Self {
        Self(siblings)
    }

    /// The empty proof. Only valid when the committed set has one member.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Does `address` belong to the set committed as `root`?
    #[must_use]
    pub fn verify_member(&self, root: &Digest, address: &Address) -> bool {
        verify(self, root, &leaf_digest(address))
    }
}

impl From<Vec<Digest>> for MembershipProof {
    fn from(siblings: Vec<Digest>) -> Self {
        Self(siblings)
    }
}

/// Canonical tree over a set of addresses.
///
/// Leaves are sorted and deduplicated; an unpaired node at the end of a level
/// moves up unchanged.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone)]
pub struct MembershipTree {
    /// `levels[0]` holds the sorted leaves, the last level holds the root.
    levels: Vec<Vec<Digest>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl MembershipTree {
    /// Build from `members`. An empty set commits to [`Digest::ZERO`].
    #[must_use]
    pub fn new(members: &[Address]) -> Self {
        let mut leaves: Vec<Digest> = members.iter().map(leaf_digest).collect();
        leaves.sort();
        leaves.dedup();

        let mut levels = vec![leaves];
        while levels.last().is_some_and(|level| level.len() > 1) {
            let below = &levels[levels.len() - 1];
            let above = below
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    _ => pair[0],
                })
                .collect();
            levels.push(above);
        }
        Self { levels }
    }

    #[must_use]
    pub fn root(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Digest::ZERO)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Proof for `member`, or `None` when it is not in the set.
    #[must_use]
    pub fn proof_for(&self, member: &Address) -> Option<MembershipProof> {
        let leaf = leaf_digest(member);
        let mut index = self.levels[0].binary_search(&leaf).ok()?;

        let mut siblings = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if let Some(node) = level.get(sibling) {
                siblings.push(*node);
            }
            index /= 2;
        }
        Some(MembershipProof(siblings))
    }
}
