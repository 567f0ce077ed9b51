//! Merkle root over an ordered list of digests.
//!
//! Levels are reduced left to right, pairing adjacent digests and hashing
//! the concatenation of their raw bytes with plain SHA-256. A level with an
//! odd count pairs its last digest with itself. This duplication rule fixes
//! the root value and must not be swapped for the "promote the odd node"
//! variant, or existing roots stop matching.

use crate::digest::EventDigest;

/// Root reported for an empty list: the all-zero digest.
///
/// It means "no proof available" and is never a valid single-event root.
pub const EMPTY_MERKLE_ROOT: EventDigest = EventDigest::zero();

/// Reduce ordered digests to a single root.
///
/// - empty list: [`EMPTY_MERKLE_ROOT`]
/// - one digest: that digest itself
/// - otherwise: pairwise reduction with last-element duplication
#[must_use]
pub fn merkle_root(leaves: &[EventDigest]) -> EventDigest {
    match leaves {
        [] => EMPTY_MERKLE_ROOT,
        [single] => *single,
        _ => {
            let mut level = leaves.to_vec();
            while level.len() > 1 {
                level = level
                    .chunks(2)
                    .filter_map(|pair| match pair {
                        [left, right] => Some(EventDigest::hash_pair(left, right)),
                        [last] => Some(EventDigest::hash_pair(last, last)),
                        _ => None,
                    })
                    .collect();
            }
            level.first().copied().unwrap_or(EMPTY_MERKLE_ROOT)
        },
    }
}
