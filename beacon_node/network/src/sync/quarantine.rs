//! A holding area for blocks whose parents are unknown.
//!
//! Blocks land here when the processor cannot attach them to the chain; the
//! second ticker periodically asks for the set of missing parents and hands
//! it to the request manager.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};
use types::Hash256;

/// Maximum number of orphan blocks tracked; the oldest entry is evicted
/// beyond this.
pub const MAX_ORPHAN_BLOCKS: usize = 64;

/// How long after requesting a root it may be requested again.
pub const REQUEST_RETRY_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Inner {
    /// Orphan block root -> its unknown parent root.
    orphans: HashMap<Hash256, Hash256>,
    /// Insertion order, for eviction.
    order: VecDeque<Hash256>,
    /// Parent roots already requested, and when.
    requested: HashMap<Hash256, Instant>,
}

#[derive(Default)]
pub struct Quarantine {
    inner: Mutex<Inner>,
}

impl Quarantine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block whose parent is unknown.
    pub fn add_orphan(&self, block_root: Hash256, parent_root: Hash256) {
        let mut inner = self.inner.lock();

        if inner.orphans.contains_key(&block_root) {
            return;
        }

        if inner.orphans.len() >= MAX_ORPHAN_BLOCKS {
            if let Some(oldest) = inner.order.pop_front() {
                inner.orphans.remove(&oldest);
            }
        }

        inner.orphans.insert(block_root, parent_root);
        inner.order.push_back(block_root);
    }

    /// The deduplicated set of missing ancestors that have not been
    /// requested recently. Roots returned here are marked as requested.
    pub fn check_missing(&self) -> Vec<Hash256> {
        self.check_missing_at(Instant::now())
    }

    fn check_missing_at(&self, now: Instant) -> Vec<Hash256> {
        let mut inner = self.inner.lock();

        // A parent that is itself quarantined will be resolved through its
        // own missing ancestor; requesting it again is redundant.
        let missing: BTreeSet<Hash256> = inner
            .orphans
            .values()
            .filter(|parent| !inner.orphans.contains_key(parent))
            .copied()
            .collect();

        missing
            .into_iter()
            .filter(|parent| {
                match inner.requested.get(parent) {
                    Some(at) if now.duration_since(*at) < REQUEST_RETRY_INTERVAL => false,
                    _ => {
                        inner.requested.insert(*parent, now);
                        true
                    }
                }
            })
            .collect()
    }

    /// A block has been imported; drop any bookkeeping tied to its root.
    pub fn block_resolved(&self, root: Hash256) {
        let mut inner = self.inner.lock();
        if inner.orphans.remove(&root).is_some() {
            inner.order.retain(|queued| *queued != root);
        }
        inner.requested.remove(&root);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().orphans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(byte: u8) -> Hash256 {
        Hash256::repeat_byte(byte)
    }

    #[test]
    fn missing_parents_are_deduplicated() {
        let quarantine = Quarantine::new();
        quarantine.add_orphan(root(1), root(9));
        quarantine.add_orphan(root(2), root(9));
        quarantine.add_orphan(root(3), root(8));

        let mut missing = quarantine.check_missing();
        missing.sort();
        assert_eq!(missing, vec![root(8), root(9)]);
    }

    #[test]
    fn recently_requested_roots_are_suppressed() {
        let quarantine = Quarantine::new();
        quarantine.add_orphan(root(1), root(9));

        let now = Instant::now();
        assert_eq!(quarantine.check_missing_at(now), vec![root(9)]);
        // Asking again immediately yields nothing.
        assert!(quarantine.check_missing_at(now).is_empty());
        // After the retry interval the root is eligible again.
        let later = now + REQUEST_RETRY_INTERVAL;
        assert_eq!(quarantine.check_missing_at(later), vec![root(9)]);
    }

    #[test]
    fn quarantined_parents_are_not_requested() {
        let quarantine = Quarantine::new();
        // 2 -> 1 -> 0, where only 0 is truly missing.
        quarantine.add_orphan(root(2), root(1));
        quarantine.add_orphan(root(1), root(0));

        assert_eq!(quarantine.check_missing(), vec![root(0)]);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let quarantine = Quarantine::new();
        for i in 0..(MAX_ORPHAN_BLOCKS + 1) {
            quarantine.add_orphan(Hash256::from_low_u64_be(i as u64), root(200));
        }
        assert_eq!(quarantine.len(), MAX_ORPHAN_BLOCKS);

        // The first insertion is the one that was evicted.
        quarantine.block_resolved(Hash256::from_low_u64_be(0));
        assert_eq!(quarantine.len(), MAX_ORPHAN_BLOCKS);
    }

    #[test]
    fn resolved_blocks_are_forgotten() {
        let quarantine = Quarantine::new();
        quarantine.add_orphan(root(1), root(9));
        let _ = quarantine.check_missing();

        quarantine.block_resolved(root(1));
        assert!(quarantine.is_empty());

        // The parent can be requested again without the retry delay once
        // its bookkeeping is gone.
        quarantine.block_resolved(root(9));
        quarantine.add_orphan(root(2), root(9));
        assert_eq!(quarantine.check_missing(), vec![root(9)]);
    }
}
