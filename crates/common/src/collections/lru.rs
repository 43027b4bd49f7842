//! Bounded recency map over the `lru` crate
//!
//! The wrapper exists so callers learn which entry was displaced by an
//! insert, which the upstream `put` hides.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache as RecencyMap;

/// Fixed-capacity map that evicts the least recently read or written key
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use loadplan_common::collections::LruCache;
///
/// let mut cache = LruCache::new(NonZeroUsize::MIN.saturating_add(1));
/// cache.put_evicting("v1|sdd|a", 1);
/// cache.put_evicting("v1|sdd|b", 2);
/// cache.get(&"v1|sdd|a");
///
/// assert_eq!(cache.put_evicting("v1|crd|a", 3), Some(("v1|sdd|b", 2)));
/// ```
#[derive(Clone, Debug)]
pub struct LruCache<K: Hash + Eq, V> {
    map: RecencyMap<K, V>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { map: RecencyMap::new(capacity) }
    }

    /// `None` for a zero capacity
    pub fn try_new(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(Self::new)
    }

    /// Insert or replace `key`, returning the pair evicted to make room.
    ///
    /// Replacing a key already present never evicts anything.
    pub fn put_evicting(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.map.contains(&key) {
            self.map.put(key, value);
            None
        } else {
            self.map.push(key, value)
        }
    }

    /// Read `key` and mark it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key)
    }

    /// Read `key` without touching its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.peek(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.map.cap().get()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
