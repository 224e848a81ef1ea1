//! The bounded, LRU-evicting web-object store (C3).
//!
//! `CacheStore` itself is not thread-safe — every operation here assumes
//! the caller already holds whatever exclusion the coordinator (C4)
//! requires for it. `age` lives in an `AtomicU64` specifically so that a
//! reader holding only shared access can still `touch` an entry without
//! promoting to a writer section (§4.4).

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const MAX_OBJECT_SIZE: usize = 100 * 1024;
pub const MAX_CACHE_SIZE: usize = 1024 * 1024;

#[derive(Debug)]
pub struct CacheEntry {
    pub key: String,
    pub object: Bytes,
    pub size: usize,
    age: AtomicU64,
}

impl CacheEntry {
    fn new(key: String, object: Bytes, age: u64) -> Self {
        let size = object.len();
        Self {
            key,
            object,
            size,
            age: AtomicU64::new(age),
        }
    }

    pub fn age(&self) -> u64 {
        self.age.load(Ordering::Relaxed)
    }

    fn set_age(&self, age: u64) {
        self.age.store(age, Ordering::Relaxed);
    }
}

/// Key → object map plus LRU bookkeeping. See module docs for the
/// single-threaded-under-discipline contract.
pub struct CacheStore {
    entries: HashMap<String, Arc<CacheEntry>>,
    total_size: usize,
    lru_clock: AtomicU64,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            total_size: 0,
            lru_clock: AtomicU64::new(0),
        }
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_age(&self) -> u64 {
        self.lru_clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Linear/hash scan for a byte-equal key; returns a cheaply-cloned
    /// reference so callers can read outside the map's own borrow.
    pub fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).cloned()
    }

    /// Refreshes `entry`'s recency. Safe to call from a reader section:
    /// the write is a relaxed atomic store, not a structural mutation.
    pub fn touch(&self, entry: &CacheEntry) {
        entry.set_age(self.next_age());
    }

    pub fn would_overflow(&self, extra: usize) -> bool {
        self.total_size + extra > MAX_CACHE_SIZE
    }

    /// Removes the entry with the smallest `age`; returns the bytes freed.
    /// Ties are broken by iteration order, which is deterministic for a
    /// given `HashMap` state but unspecified across insertions/removals —
    /// acceptable per §4.3.
    pub fn evict_one(&mut self) -> usize {
        let oldest_key = self
            .entries
            .values()
            .min_by_key(|e| e.age())
            .map(|e| e.key.clone());

        match oldest_key {
            Some(key) => {
                let entry = self.entries.remove(&key).expect("key came from iteration");
                self.total_size -= entry.size;
                entry.size
            }
            None => 0,
        }
    }

    /// Inserts `object` under `key`, stamping a fresh age. Caller must have
    /// already checked `size ≤ MAX_OBJECT_SIZE` and made room via
    /// `evict_one`; this method does not itself evict.
    pub fn insert(&mut self, key: String, object: Bytes) {
        let age = self.next_age();
        let entry = Arc::new(CacheEntry::new(key.clone(), object, age));
        self.total_size += entry.size;
        self.entries.insert(key, entry);
    }

    /// Runs the admission algorithm of §4.3, evicting as needed and
    /// refusing to duplicate a key admitted by a racing writer.
    pub fn admit(&mut self, key: String, object: Bytes) {
        let size = object.len();
        if size > MAX_OBJECT_SIZE {
            return;
        }
        while self.would_overflow(size) && self.lookup(&key).is_none() {
            if self.evict_one() == 0 {
                break;
            }
        }
        if self.lookup(&key).is_none() {
            self.insert(key, object);
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
