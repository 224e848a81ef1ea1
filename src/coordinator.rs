//! First-readers-writers (reader-preference) mutual exclusion around the
//! cache store (C4). Modeled directly on the `readcnt`/`mutex`/semaphore
//! protocol: `readcnt` lives behind an async mutex (`m`), write access is
//! an async semaphore with a single permit (`w`). The inner `std::sync`
//! lock around the store exists only so Rust's aliasing rules are
//! satisfied once a caller has already won admission under that protocol —
//! it never itself blocks a caller who the readcnt/semaphore dance has
//! already let through.

use crate::cache::CacheStore;
use bytes::Bytes;
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

pub struct CacheCoordinator {
    readcnt: AsyncMutex<usize>,
    writer: Semaphore,
    store: StdMutex<CacheStore>,
}

impl CacheCoordinator {
    pub fn new() -> Self {
        Self {
            readcnt: AsyncMutex::new(0),
            writer: Semaphore::new(1),
            store: StdMutex::new(CacheStore::new()),
        }
    }

    async fn reader_enter(&self) {
        let mut count = self.readcnt.lock().await;
        *count += 1;
        if *count == 1 {
            // acquire_owned would let us hold across an await without the
            // guard borrowing self; we only need it for this instant so a
            // plain forget-the-permit acquire suffices.
            self.writer.acquire().await.expect("semaphore never closed").forget();
        }
    }

    async fn reader_exit(&self) {
        let mut count = self.readcnt.lock().await;
        *count -= 1;
        if *count == 0 {
            self.writer.add_permits(1);
        }
    }

    /// Reader section: on a cache hit, returns the cached object bytes and
    /// refreshes its recency. Returns `None` on a miss.
    pub async fn read_try(&self, key: &str) -> Option<Bytes> {
        self.reader_enter().await;

        let result = {
            let store = self.store.lock().expect("cache store mutex poisoned");
            store.lookup(key).map(|entry| {
                store.touch(&entry);
                entry.object.clone()
            })
        };

        self.reader_exit().await;
        result
    }

    /// Writer section: runs the admission algorithm of §4.3 under
    /// exclusive access.
    pub async fn write_admit(&self, key: String, object: Bytes) {
        let permit = self.writer.acquire().await.expect("semaphore never closed");
        {
            let mut store = self.store.lock().expect("cache store mutex poisoned");
            store.admit(key, object);
        }
        drop(permit);
    }

    pub async fn len(&self) -> usize {
        let _permit = self.writer.acquire().await.expect("semaphore never closed");
        self.store.lock().expect("cache store mutex poisoned").len()
    }

    pub async fn total_size(&self) -> usize {
        let _permit = self.writer.acquire().await.expect("semaphore never closed");
        self.store
            .lock()
            .expect("cache store mutex poisoned")
            .total_size()
    }
}

impl Default for CacheCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
