//! Path cache (component E) write-side abstraction.
//!
//! The cache itself is the BPF hash map exposed by
//! `scion_xlat_ebpf::attachment::PathCacheHandle`; this crate only
//! depends on the write contract so the path service (component G) can
//! be built and tested without a kernel or `CAP_BPF`. `InMemoryPathCache`
//! is both this crate's test double and a viable non-BPF backend (e.g.
//! a userspace-only deployment mode): `arc_swap::ArcSwap` holds an
//! immutable `HashMap` snapshot, so concurrent readers (`lookup`) never
//! block and always see either the whole old map or the whole new one,
//! matching component E's atomicity invariant without a lock.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use arc_swap::ArcSwap;
use scion_xlat_common::{MapKey, PathEntry};

use crate::error::PathServiceError;

/// Writer-side view of component E. Readers (the fast path) only ever
/// look entries up; only the path service calls `upsert`.
pub trait PathCacheWriter: Send {
    fn upsert(&mut self, key: MapKey, entry: PathEntry) -> Result<(), PathServiceError>;
}

pub const CAPACITY: usize = 4096;

/// Lock-free-read in-memory path cache. Single writer (enforced by
/// `&mut self` on `upsert`, matching component E's ownership: G is the
/// cache's only writer), many lock-free readers via `lookup`.
#[derive(Debug)]
pub struct InMemoryPathCache {
    snapshot: ArcSwap<HashMap<MapKey, PathEntry>>,
    insertion_order: VecDeque<MapKey>,
}

impl Default for InMemoryPathCache {
    fn default() -> Self {
        Self { snapshot: ArcSwap::from_pointee(HashMap::new()), insertion_order: VecDeque::new() }
    }
}

impl InMemoryPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait-free for readers: a single atomic load of the current
    /// snapshot `Arc`.
    pub fn lookup(&self, key: MapKey) -> Option<PathEntry> {
        self.snapshot.load().get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }
}

impl PathCacheWriter for InMemoryPathCache {
    fn upsert(&mut self, key: MapKey, entry: PathEntry) -> Result<(), PathServiceError> {
        let current = self.snapshot.load();
        let mut next: HashMap<MapKey, PathEntry> = (**current).clone();

        if !next.contains_key(&key) && next.len() >= CAPACITY {
            if let Some(oldest) = self.insertion_order.pop_front() {
                next.remove(&oldest);
            }
        }
        if next.insert(key, entry).is_none() {
            self.insertion_order.push_back(key);
        }

        self.snapshot.store(Arc::new(next));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scion_xlat_common::IsdAsnValue;

    fn dummy_entry() -> PathEntry {
        PathEntry::new(IsdAsnValue::new(1, 10), IsdAsnValue::new(1, 11), &[], [0u8; 16], 30042)
            .unwrap()
    }

    #[test]
    fn upsert_then_lookup_whole_entry() {
        let mut cache = InMemoryPathCache::new();
        let key = MapKey::new(1, 10);
        cache.upsert(key, dummy_entry()).unwrap();
        assert!(cache.lookup(key).is_some());
        assert!(cache.lookup(MapKey::new(1, 99)).is_none());
    }

    #[test]
    fn newest_upsert_replaces_whole_entry() {
        let mut cache = InMemoryPathCache::new();
        let key = MapKey::new(1, 10);
        let mut first = dummy_entry();
        first.router_port = 30042;
        cache.upsert(key, first).unwrap();
        let mut second = dummy_entry();
        second.router_port = 30043;
        cache.upsert(key, second).unwrap();
        assert_eq!(cache.lookup(key).unwrap().router_port, 30043);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = InMemoryPathCache::new();
        for i in 0..CAPACITY as u32 {
            cache.upsert(MapKey::new(1, i), dummy_entry()).unwrap();
        }
        assert_eq!(cache.len(), CAPACITY);
        cache.upsert(MapKey::new(1, CAPACITY as u32), dummy_entry()).unwrap();
        assert_eq!(cache.len(), CAPACITY);
        assert!(cache.lookup(MapKey::new(1, 0)).is_none());
        assert!(cache.lookup(MapKey::new(1, CAPACITY as u32)).is_some());
    }

    #[test]
    fn lookup_observes_a_whole_entry_snapshot_mid_upsert_sequence() {
        let mut cache = InMemoryPathCache::new();
        let key = MapKey::new(1, 1);
        for port in 0..50u16 {
            let mut entry = dummy_entry();
            entry.router_port = port;
            cache.upsert(key, entry).unwrap();
            // Every intermediate snapshot is a fully-formed entry, never
            // a partially-written one - `lookup` only ever hands back a
            // value that was `Arc::new`d whole in some prior `upsert`.
            let seen = cache.lookup(key).unwrap();
            assert_eq!(seen.router_port, port);
        }
    }
}
