//! Per-key async locks for work that must not run twice concurrently.
//!
//! Telegram retries a webhook delivery when the first attempt is slow, so the
//! same post can arrive again while its upload is still running. Holding the
//! lock for a key while checking and filling the dedup store turns the second
//! delivery into a cache hit instead of a second upload.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct InflightLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of the critical section. Dropping it releases the
/// key and removes the table entry once nobody else holds or awaits it.
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct InflightGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl InflightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free, then hold it.
    pub async fn acquire(&self, key: impl Into<String>) -> InflightGuard<'_> {
        let key = key.into();
        // The shard lock is released at the end of this statement, before awaiting.
        let mutex = Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let guard = mutex.lock_owned().await;
        InflightGuard {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }

    /// Keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        // Release first so the table holds the only remaining reference
        // when no waiter cloned the mutex.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
