//! Consistent hashing ring implementation.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::config::RingConfig;
use crate::hash::{HashFn, vnode_label};
use crate::snapshot::Snapshot;

/// Consistent hashing ring mapping string keys to node names.
///
/// Each node occupies `replicas` virtual positions on a u32 ring, at
/// `hash(index ++ name)`. A key belongs to the owner of the first position
/// at or after `hash(key)`, wrapping around past the largest position.
///
/// The current [`Snapshot`] is published through an [`ArcSwap`]: lookups
/// load it without locking, and writers serialize on `write_lock` while they
/// build and publish a modified copy.
pub struct Ring {
    /// Currently published snapshot.
    current: ArcSwap<Snapshot>,
    /// Serializes `add`/`remove`. Never taken by lookups.
    write_lock: Mutex<()>,
    /// Virtual nodes per real node.
    replicas: usize,
    /// Hash for keys and virtual node labels.
    hash: HashFn,
}

impl Ring {
    /// Create an empty ring.
    ///
    /// `hash` defaults to CRC-32/IEEE. A `replicas` of 0 is accepted but the
    /// ring will never route any key.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        if replicas == 0 {
            warn!("ring created with zero replicas; no key will ever be routed");
        }
        Self {
            current: ArcSwap::from_pointee(Snapshot::new()),
            write_lock: Mutex::new(()),
            replicas,
            hash: hash.unwrap_or_default(),
        }
    }

    /// Build a ring from config and add the configured nodes.
    pub fn from_config(config: &RingConfig) -> Self {
        let ring = Self::new(config.replicas, Some(config.hash.into()));
        if !config.nodes.is_empty() {
            ring.add(&config.nodes);
        }
        ring
    }

    /// Add one or more nodes, each at `replicas` virtual positions.
    ///
    /// Re-adding a node rewrites the same positions with the same owner and
    /// leaves routing unchanged. If a position is already owned by another
    /// node, the last writer wins.
    pub fn add<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _guard = self.write_lock.lock().expect("ring write lock poisoned");
        let mut next = Snapshot::clone(&self.current.load());

        let mut added = Vec::new();
        for name in names {
            let name = name.as_ref();
            let owner: Arc<str> = Arc::from(name);
            for i in 0..self.replicas {
                let pos = self.hash.hash(&vnode_label(i, name));
                if next.owners.insert(pos, Arc::clone(&owner)).is_none() {
                    next.positions.push(pos);
                }
            }
            added.push(owner);
        }
        next.positions.sort_unstable();

        let vnodes = next.vnode_count();
        self.current.store(Arc::new(next));
        debug!(?added, vnodes, "added nodes to ring");
    }

    /// Add a single node.
    pub fn add_node(&self, name: &str) {
        self.add([name]);
    }

    /// Remove every virtual position owned by `name`.
    ///
    /// Positions are checked in replica order. The first position that is
    /// missing or owned by another node stops the removal; positions already
    /// removed stay removed and the rest of the node's positions stay on the
    /// ring. The result is published either way.
    ///
    /// Returns the number of positions removed.
    pub fn remove(&self, name: &str) -> usize {
        let _guard = self.write_lock.lock().expect("ring write lock poisoned");
        let mut next = Snapshot::clone(&self.current.load());

        let mut removed = 0;
        for i in 0..self.replicas {
            let pos = self.hash.hash(&vnode_label(i, name));
            let owned = next.owners.get(&pos).is_some_and(|owner| &**owner == name);
            if !owned {
                if removed > 0 {
                    warn!(name, replica = i, removed, "removal stopped at mismatched position");
                } else {
                    debug!(name, "node not on ring, nothing removed");
                }
                break;
            }
            if let Ok(idx) = next.positions.binary_search(&pos) {
                next.positions.remove(idx);
            }
            next.owners.remove(&pos);
            removed += 1;
        }

        let vnodes = next.vnode_count();
        self.current.store(Arc::new(next));
        if removed > 0 {
            debug!(name, removed, vnodes, "removed node from ring");
        }
        removed
    }

    /// Node owning `key`, or `None` if the ring has no positions.
    ///
    /// Never blocks: reads whichever snapshot is published at the time of
    /// the call.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        let snapshot = self.current.load();
        snapshot.locate_shared(self.hash.hash(key.as_bytes())).cloned()
    }

    /// The currently published snapshot.
    ///
    /// Holding it pins that ring state: later mutations publish new
    /// snapshots and never touch this one.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Hash function used for keys and virtual nodes.
    pub fn hash_fn(&self) -> &HashFn {
        &self.hash
    }

    /// Virtual nodes per real node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Number of distinct nodes currently on the ring.
    pub fn node_count(&self) -> usize {
        self.current.load().node_count()
    }

    /// Number of virtual positions currently on the ring.
    pub fn vnode_count(&self) -> usize {
        self.current.load().vnode_count()
    }

    /// True if no key can be routed.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl std::fmt::Debug for Ring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("replicas", &self.replicas)
            .field("vnodes", &self.vnode_count())
            .finish_non_exhaustive()
    }
}
