//! Immutable view of the ring at one point in time.
//!
//! A [`Snapshot`] is never modified after it is published. Mutations build a
//! fresh copy (see [`Ring`](crate::Ring)) and readers that still hold the old
//! `Arc<Snapshot>` keep using it until they drop it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::hash::HashFn;

/// Sorted virtual-node positions plus the owner of each position.
///
/// Invariant: `positions` is strictly ascending and holds exactly the keys of
/// `owners`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) positions: Vec<u32>,
    pub(crate) owners: HashMap<u32, Arc<str>>,
}

/// A key whose owner differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    /// The key that moved.
    pub key: String,
    /// Owner in the old snapshot (`None` if the old ring was empty).
    pub from: Option<Arc<str>>,
    /// Owner in the new snapshot (`None` if the new ring is empty).
    pub to: Option<Arc<str>>,
}

impl Snapshot {
    /// An empty snapshot: no positions, no owners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner of the first position at or after `hash`, wrapping to the
    /// lowest position when `hash` is past the end of the ring.
    ///
    /// Returns `None` only when the snapshot has no positions.
    pub fn locate(&self, hash: u32) -> Option<&str> {
        self.locate_shared(hash).map(|name| &**name)
    }

    pub(crate) fn locate_shared(&self, hash: u32) -> Option<&Arc<str>> {
        if self.positions.is_empty() {
            return None;
        }
        let idx = self.positions.partition_point(|&pos| pos < hash);
        let pos = self.positions[idx % self.positions.len()];
        self.owners.get(&pos)
    }

    /// Number of virtual-node positions.
    pub fn vnode_count(&self) -> usize {
        self.positions.len()
    }

    /// True if no key can be routed.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Distinct node names, sorted.
    pub fn node_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.owners.values().map(|n| &**n).collect();
        names.into_iter().collect()
    }

    /// Number of distinct nodes that own at least one position.
    pub fn node_count(&self) -> usize {
        self.node_names().len()
    }

    /// True if `name` owns at least one position.
    pub fn contains_node(&self, name: &str) -> bool {
        self.owners.values().any(|n| &**n == name)
    }

    /// The sorted position sequence.
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Owner of an exact position, if any.
    pub fn owner_of(&self, position: u32) -> Option<&str> {
        self.owners.get(&position).map(|n| &**n)
    }

    /// Report every key in `keys` whose owner differs between `old` and `new`.
    ///
    /// Only reports; the caller decides what to invalidate or refetch.
    pub fn remapped<'k, I>(old: &Snapshot, new: &Snapshot, keys: I, hash: &HashFn) -> Vec<Remap>
    where
        I: IntoIterator<Item = &'k str>,
    {
        keys.into_iter()
            .filter_map(|key| {
                let h = hash.hash(key.as_bytes());
                let from = old.locate_shared(h);
                let to = new.locate_shared(h);
                (from != to).then(|| Remap {
                    key: key.to_string(),
                    from: from.cloned(),
                    to: to.cloned(),
                })
            })
            .collect()
    }

    /// Check the ordering/uniqueness invariant. Used by tests.
    pub fn is_consistent(&self) -> bool {
        self.positions.windows(2).all(|w| w[0] < w[1])
            && self.positions.len() == self.owners.len()
            && self.positions.iter().all(|p| self.owners.contains_key(p))
    }
}
