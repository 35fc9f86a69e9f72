//! Two-Bucket Storage Engine
//!
//! This module implements the state behind an expirable store: a `live`
//! bucket of entries that are still within their lifespan and an `expired`
//! bucket of entries a scan pass found past it. Both buckets sit behind a
//! single mutex, so an entry is always in exactly one of them (or in neither
//! once it is removed or flushed).
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: Mutations, expiry scans and flushes all take the same
//!    lock. A flush forced from inside a scan pass therefore cannot race or
//!    deadlock with the scheduled cleanup pass.
//! 2. **Scan-Time Expiry**: An entry is moved only when a scan pass sees it.
//!    Between passes it stays readable even if its age passed its lifespan.
//! 3. **Guarded Hooks**: The expiry and clean hooks run under the lock, in
//!    pass order. A panicking hook is caught and counted; the pass continues.
//!
//! ## Entry Lifecycle
//!
//! ```text
//!   add ──> live ──(scan: age >= lifespan)──> expired ──(flush)──> dropped
//!            │  ▲                                │
//!            │  └── delay (age reset to zero)    └── add (same key) re-inserts live
//!            └── remove ──> dropped
//! ```

use crate::config::Settings;
use crate::error::{Result, StoreError};
use crate::storage::Key;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Hook invoked once per entry when a scan pass moves it to the expired bucket.
pub type ExpiryHook<V> = Arc<dyn Fn(&Key, &V) + Send + Sync>;

/// Hook invoked once per flush, before the expired bucket is emptied.
pub type CleanHook = Arc<dyn Fn() + Send + Sync>;

/// Callbacks supplied at construction.
///
/// Hooks run while the store lock is held. They are notifications only and
/// must not call back into the store.
pub struct Hooks<V> {
    on_expiry: Option<ExpiryHook<V>>,
    on_clean: Option<CleanHook>,
}

impl<V> Hooks<V> {
    /// Creates an empty set of hooks.
    pub fn new() -> Self {
        Self {
            on_expiry: None,
            on_clean: None,
        }
    }

    /// Sets the per-entry expiry hook.
    pub fn on_expiry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Key, &V) + Send + Sync + 'static,
    {
        self.on_expiry = Some(Arc::new(hook));
        self
    }

    /// Sets the flush hook.
    pub fn on_clean<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_clean = Some(Arc::new(hook));
        self
    }
}

impl<V> Default for Hooks<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Hooks<V> {
    fn clone(&self) -> Self {
        Self {
            on_expiry: self.on_expiry.clone(),
            on_clean: self.on_clean.clone(),
        }
    }
}

impl<V> std::fmt::Debug for Hooks<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_expiry", &self.on_expiry.is_some())
            .field("on_clean", &self.on_clean.is_some())
            .finish()
    }
}

/// A stored value with its age clock.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The actual value stored
    pub value: V,
    /// When the entry was inserted or last had its expiry delayed
    pub touched_at: Instant,
    /// How long the entry may stay live, measured from `touched_at`
    pub lifespan: Duration,
}

impl<V> Entry<V> {
    /// Creates a new entry whose clock starts now.
    pub fn new(value: V, lifespan: Duration) -> Self {
        Self {
            value,
            touched_at: Instant::now(),
            lifespan,
        }
    }

    /// Time elapsed since the entry was inserted or last refreshed.
    #[inline]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.touched_at)
    }

    /// Checks whether the entry has outlived its own lifespan at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.age(now) >= self.lifespan
    }
}

#[derive(Debug)]
struct Buckets<V> {
    live: HashMap<Key, Entry<V>>,
    expired: HashMap<Key, Entry<V>>,
}

/// The state container and scan logic of an expirable store.
///
/// # Thread Safety
///
/// Designed to be wrapped in an `Arc` and shared between the public store
/// handle and the two background loops. All operations are thread-safe.
pub struct StorageEngine<V> {
    buckets: Mutex<Buckets<V>>,
    hooks: Hooks<V>,
    settings: Settings,

    /// Statistics: total inserts
    insert_count: AtomicU64,

    /// Statistics: total removals that hit a live entry
    remove_count: AtomicU64,

    /// Statistics: entries moved to the expired bucket
    expired_count: AtomicU64,

    /// Statistics: flushes of a non-empty expired bucket
    flush_count: AtomicU64,

    /// Statistics: hook invocations that panicked
    hook_panic_count: AtomicU64,
}

impl<V> std::fmt::Debug for StorageEngine<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buckets = self.lock();
        f.debug_struct("StorageEngine")
            .field("live", &buckets.live.len())
            .field("expired", &buckets.expired.len())
            .field("settings", &self.settings)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<V> StorageEngine<V> {
    /// Creates an empty engine.
    pub fn new(settings: Settings, hooks: Hooks<V>) -> Self {
        Self {
            buckets: Mutex::new(Buckets {
                live: HashMap::new(),
                expired: HashMap::new(),
            }),
            hooks,
            settings,
            insert_count: AtomicU64::new(0),
            remove_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            hook_panic_count: AtomicU64::new(0),
        }
    }

    /// The resolved settings this engine runs with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // Hooks are run under catch_unwind, so a poisoned lock still holds
    // consistent buckets.
    fn lock(&self) -> MutexGuard<'_, Buckets<V>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `value` under `key` in the live bucket.
    ///
    /// Overwrites any live entry for the key. A stale copy of the key in the
    /// expired bucket is dropped so the buckets stay disjoint.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was not live before.
    pub fn insert(&self, key: Key, value: V, lifespan: Duration) -> bool {
        self.insert_count.fetch_add(1, Ordering::Relaxed);

        let mut buckets = self.lock();
        buckets.expired.remove(&key);
        buckets
            .live
            .insert(key, Entry::new(value, lifespan))
            .is_none()
    }

    /// Resets the age clock of a live entry.
    ///
    /// A key that is absent (or already expired) is a silent no-op unless
    /// `strict` is set, in which case [`StoreError::NotFound`] is returned.
    pub fn delay(&self, key: &Key, strict: bool) -> Result<()> {
        let mut buckets = self.lock();
        match buckets.live.get_mut(key) {
            Some(entry) => {
                entry.touched_at = Instant::now();
                Ok(())
            }
            None if strict => Err(StoreError::NotFound(key.clone())),
            None => Ok(()),
        }
    }

    /// Deletes a key from the live bucket.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live entry was deleted.
    pub fn remove(&self, key: &Key) -> bool {
        let removed = self.lock().live.remove(key).is_some();
        if removed {
            self.remove_count.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Returns the age of a live entry.
    pub fn life(&self, key: &Key) -> Result<Duration> {
        let now = Instant::now();
        self.lock()
            .live
            .get(key)
            .map(|entry| entry.age(now))
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// Checks whether a key is live.
    pub fn contains(&self, key: &Key) -> bool {
        self.lock().live.contains_key(key)
    }

    /// Checks whether a key sits in the expired bucket.
    pub fn is_expired(&self, key: &Key) -> bool {
        self.lock().expired.contains_key(key)
    }

    /// Number of live entries.
    pub fn live_len(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of entries awaiting cleanup.
    pub fn expired_len(&self) -> usize {
        self.lock().expired.len()
    }

    /// Keys currently live, in no particular order.
    pub fn live_keys(&self) -> Vec<Key> {
        self.lock().live.keys().cloned().collect()
    }

    /// Keys currently awaiting cleanup, in no particular order.
    pub fn expired_keys(&self) -> Vec<Key> {
        self.lock().expired.keys().cloned().collect()
    }

    /// Runs one expiry scan pass.
    ///
    /// Every live entry whose age reached its own lifespan is handed to the
    /// expiry hook and moved to the expired bucket. If the batch would push
    /// the bucket past `max_expired_entries`, the bucket is flushed first;
    /// a batch larger than the capacity flushes again whenever the bucket
    /// fills up, so the bound holds when the pass returns.
    ///
    /// # Returns
    ///
    /// Returns the number of entries moved.
    pub fn scan_expired(&self) -> usize {
        let max = self.settings.max_expired_entries;
        let now = Instant::now();
        let mut buckets = self.lock();

        let due: Vec<Key> = buckets
            .live
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        if due.is_empty() {
            return 0;
        }

        if due.len() + buckets.expired.len() > max {
            self.flush_locked(&mut buckets);
        }

        let mut moved = 0;
        for key in due {
            if buckets.expired.len() >= max {
                self.flush_locked(&mut buckets);
            }
            if let Some(entry) = buckets.live.remove(&key) {
                if let Some(hook) = &self.hooks.on_expiry {
                    self.guarded("on_expiry", || hook(&key, &entry.value));
                }
                buckets.expired.insert(key, entry);
                moved += 1;
            }
        }

        self.expired_count.fetch_add(moved as u64, Ordering::Relaxed);
        debug!(
            expired = moved,
            live = buckets.live.len(),
            pending = buckets.expired.len(),
            "Expiry scan moved entries"
        );

        moved
    }

    /// Flushes the expired bucket.
    ///
    /// Invokes the clean hook, then discards every expired entry. An empty
    /// bucket is left alone and the hook is not called.
    ///
    /// # Returns
    ///
    /// Returns the number of entries discarded.
    pub fn flush_expired(&self) -> usize {
        let mut buckets = self.lock();
        self.flush_locked(&mut buckets)
    }

    fn flush_locked(&self, buckets: &mut Buckets<V>) -> usize {
        if buckets.expired.is_empty() {
            return 0;
        }

        if let Some(hook) = &self.hooks.on_clean {
            self.guarded("on_clean", || hook());
        }

        let flushed = std::mem::take(&mut buckets.expired).len();
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        debug!(flushed = flushed, "Expired bucket flushed");

        flushed
    }

    fn guarded<F: FnOnce()>(&self, hook: &'static str, f: F) {
        if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
            self.hook_panic_count.fetch_add(1, Ordering::Relaxed);
            warn!(hook = hook, "Store hook panicked; continuing scan");
        }
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let (live, expired) = {
            let buckets = self.lock();
            (buckets.live.len(), buckets.expired.len())
        };

        StoreStats {
            live,
            expired,
            inserts: self.insert_count.load(Ordering::Relaxed),
            removals: self.remove_count.load(Ordering::Relaxed),
            expirations: self.expired_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            hook_panics: self.hook_panic_count.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> StorageEngine<V> {
    /// Gets a clone of the value stored under a live key.
    ///
    /// The expired bucket is not consulted.
    pub fn get(&self, key: &Key) -> Result<V> {
        self.lock()
            .live
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// Clones the live bucket into a list of key/value pairs.
    pub fn snapshot_live(&self) -> Vec<(Key, V)> {
        Self::snapshot(&self.lock().live)
    }

    /// Clones the expired bucket into a list of key/value pairs.
    pub fn snapshot_expired(&self) -> Vec<(Key, V)> {
        Self::snapshot(&self.lock().expired)
    }

    fn snapshot(bucket: &HashMap<Key, Entry<V>>) -> Vec<(Key, V)> {
        bucket
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Entries currently live
    pub live: usize,
    /// Entries currently awaiting cleanup
    pub expired: usize,
    /// Total inserts
    pub inserts: u64,
    /// Total removals of live entries
    pub removals: u64,
    /// Total entries moved to the expired bucket
    pub expirations: u64,
    /// Total flushes of a non-empty expired bucket
    pub flushes: u64,
    /// Total hook invocations that panicked
    pub hook_panics: u64,
}
