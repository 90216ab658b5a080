use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Process-lifetime index of target keys that have already been claimed for
/// replay.
///
/// `claim` is an atomic check-and-set, so if dispatch is ever parallelized
/// this index stays the single synchronization point. Unbounded by default:
/// the index never forgets a target. A capacity switches it to LRU eviction,
/// trading bounded memory for occasionally replaying an evicted target again.
pub struct ReplayedTargets {
    inner: Mutex<Index>,
}

enum Index {
    Unbounded(HashSet<String>),
    Bounded(LruCache<String, ()>),
}

impl ReplayedTargets {
    pub fn new(max_targets: usize) -> Self {
        let inner = match NonZeroUsize::new(max_targets) {
            None => Index::Unbounded(HashSet::new()),
            Some(capacity) => Index::Bounded(LruCache::new(capacity)),
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Returns true exactly once per key: the caller that sees true owns the
    /// replay for that target. Claimed before dispatch, never after.
    pub fn claim(&self, key: &str) -> bool {
        let mut index = self.inner.lock().expect("replayed-targets lock poisoned");
        match &mut *index {
            Index::Unbounded(set) => set.insert(key.to_string()),
            Index::Bounded(cache) => cache.put(key.to_string(), ()).is_none(),
        }
    }

    pub fn len(&self) -> usize {
        let index = self.inner.lock().expect("replayed-targets lock poisoned");
        match &*index {
            Index::Unbounded(set) => set.len(),
            Index::Bounded(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
