//! Compressed vertex sets used for frontiers and visited tracking.
//!
//! A [`FrontierSet`] is an exact set of 64-bit node identifiers backed by a
//! two-level roaring bitmap. It has no interior locking: engines hand sets
//! between threads by value and only ever mutate a set from one thread at a
//! time.

use std::fmt;

use roaring::RoaringTreemap;

use crate::types::NodeId;

/// Exact set of [`NodeId`]s tuned for sparse, multi-million element frontiers.
#[derive(Clone, PartialEq)]
pub struct FrontierSet {
    bits: RoaringTreemap,
}

impl FrontierSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            bits: RoaringTreemap::new(),
        }
    }

    /// Adds `node`, returning `true` if it was not already present.
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.bits.insert(node.0)
    }

    /// Whether `node` is a member.
    pub fn contains(&self, node: NodeId) -> bool {
        self.bits.contains(node.0)
    }

    /// In-place union: `self ∪= other`.
    pub fn union_with(&mut self, other: &FrontierSet) {
        self.bits |= &other.bits;
    }

    /// In-place difference: `self −= other`.
    pub fn difference_with(&mut self, other: &FrontierSet) {
        self.bits -= &other.bits;
    }

    /// Number of members.
    pub fn len(&self) -> u64 {
        self.bits.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Removes every member while keeping the set usable as a destination buffer.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Iterates members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bits.iter().map(NodeId)
    }
}

impl Default for FrontierSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrontierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontierSet")
            .field("len", &self.len())
            .finish()
    }
}

impl FromIterator<NodeId> for FrontierSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = FrontierSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<NodeId> for FrontierSet {
    fn extend<I: IntoIterator<Item = NodeId>>(&mut self, iter: I) {
        for node in iter {
            self.bits.insert(node.0);
        }
    }
}
