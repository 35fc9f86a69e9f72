//! The Expirable Store
//!
//! [`ExpirableStore`] ties a [`StorageEngine`] to its [`ScanLoops`]. It is the
//! public surface: keyed mutation, lookups, iteration, and the pause/resume
//! and stop controls of the background loops.
//!
//! ## Example
//!
//! ```no_run
//! use expirable::{ExpirableStore, Hooks, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), expirable::StoreError> {
//!     let hooks = Hooks::new()
//!         .on_expiry(|key, value: &String| println!("{} expired ({})", key, value))
//!         .on_clean(|| println!("expired entries purged"));
//!
//!     let store = ExpirableStore::with_hooks(
//!         StoreConfig::default().with_cleanup_interval(Duration::from_millis(2500)),
//!         hooks,
//!     )?;
//!
//!     store.add("abc", "something".to_string())?;
//!     store.delay_expiry("abc", true)?;
//!     assert_eq!(store.get("abc")?, "something");
//!     Ok(())
//! }
//! ```

use crate::config::{Settings, StoreConfig};
use crate::error::{Result, StoreError};
use crate::storage::{Hooks, IntoKey, Key, ScanLoops, StorageEngine, StoreStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// A keyed store whose entries expire after a lifespan.
///
/// Entries live in a *live* bucket until an expiry pass finds them past
/// their lifespan, then sit in an *expired* bucket until a cleanup pass
/// flushes it. Both passes run as Tokio tasks started by the constructor and
/// stopped when the store is dropped (or [`stop`](Self::stop) is called).
///
/// # Thread Safety
///
/// All methods take `&self`; wrap the store in an `Arc` to share it.
#[derive(Debug)]
pub struct ExpirableStore<V> {
    engine: Arc<StorageEngine<V>>,
    loops: ScanLoops,
}

impl<V> ExpirableStore<V>
where
    V: Send + 'static,
{
    /// Creates a store without hooks and starts both scan loops.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the configuration does not resolve,
    /// or [`StoreError::NoRuntime`] when called outside a Tokio runtime.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_hooks(config, Hooks::new())
    }

    /// Creates a store with expiry/clean hooks and starts both scan loops.
    pub fn with_hooks(config: StoreConfig, hooks: Hooks<V>) -> Result<Self> {
        let settings = config.resolve()?;
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let engine = Arc::new(StorageEngine::new(settings, hooks));
        let loops = ScanLoops::start(Arc::clone(&engine), &runtime);

        Ok(Self { engine, loops })
    }
}

impl<V> ExpirableStore<V> {
    /// Inserts `value` with the default lifespan, replacing any live entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for a non-primitive key; the store
    /// is left unchanged.
    pub fn add<K: IntoKey>(&self, key: K, value: V) -> Result<()> {
        let lifespan = self.engine.settings().entry_lifespan;
        self.add_with_lifespan(key, value, lifespan)
    }

    /// Inserts `value` with its own lifespan, replacing any live entry.
    pub fn add_with_lifespan<K: IntoKey>(
        &self,
        key: K,
        value: V,
        lifespan: Duration,
    ) -> Result<()> {
        let key = key.into_key()?;
        self.engine.insert(key, value, lifespan);
        Ok(())
    }

    /// Resets the age of a live entry to zero.
    ///
    /// An absent key is ignored, unless `strict` is set, in which case
    /// [`StoreError::NotFound`] is returned. Expired entries are never
    /// brought back.
    pub fn delay_expiry<K: IntoKey>(&self, key: K, strict: bool) -> Result<()> {
        self.engine.delay(&key.into_key()?, strict)
    }

    /// Deletes a live entry. Returns whether one was there.
    pub fn remove<K: IntoKey>(&self, key: K) -> Result<bool> {
        Ok(self.engine.remove(&key.into_key()?))
    }

    /// Returns how long a live entry has been alive since insertion or its
    /// last delay.
    pub fn life<K: IntoKey>(&self, key: K) -> Result<Duration> {
        self.engine.life(&key.into_key()?)
    }

    /// Checks whether a key is live. Non-primitive keys are never live.
    pub fn contains<K: IntoKey>(&self, key: K) -> bool {
        key.into_key()
            .map(|key| self.engine.contains(&key))
            .unwrap_or(false)
    }

    /// Checks whether a key is waiting in the expired bucket.
    pub fn is_expired<K: IntoKey>(&self, key: K) -> bool {
        key.into_key()
            .map(|key| self.engine.is_expired(&key))
            .unwrap_or(false)
    }

    /// Stops future expiry passes until [`resume`](Self::resume).
    ///
    /// A pass already in flight completes. Cleanup passes keep running.
    pub fn pause(&self) {
        self.loops.pause();
    }

    /// Restarts expiry passes after a [`pause`](Self::pause).
    ///
    /// Runs one pass immediately, then continues on the regular period.
    /// Does nothing if the store is not paused.
    pub fn resume(&self) {
        if self.loops.resume() {
            self.engine.scan_expired();
        }
    }

    /// Checks whether expiry passes are paused.
    pub fn is_paused(&self) -> bool {
        self.loops.is_paused()
    }

    /// Stops both scan loops for good.
    ///
    /// The buckets stay readable and writable; nothing expires or gets
    /// flushed afterwards unless [`scan`](Self::scan) or
    /// [`clean`](Self::clean) is called by hand.
    pub fn stop(&self) {
        self.loops.stop();
    }

    /// Checks whether the scan loops were stopped.
    pub fn is_stopped(&self) -> bool {
        self.loops.is_stopped()
    }

    /// Runs one expiry pass now. Returns the number of entries moved.
    pub fn scan(&self) -> usize {
        self.engine.scan_expired()
    }

    /// Flushes the expired bucket now. Returns the number of entries dropped.
    pub fn clean(&self) -> usize {
        self.engine.flush_expired()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.engine.live_len()
    }

    /// Returns true if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries awaiting cleanup.
    pub fn expired_len(&self) -> usize {
        self.engine.expired_len()
    }

    /// Keys currently live, in no particular order.
    pub fn live_keys(&self) -> Vec<Key> {
        self.engine.live_keys()
    }

    /// Keys awaiting cleanup, in no particular order.
    pub fn expired_keys(&self) -> Vec<Key> {
        self.engine.expired_keys()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        self.engine.stats()
    }

    /// The resolved configuration.
    pub fn settings(&self) -> &Settings {
        self.engine.settings()
    }
}

impl<V: Clone> ExpirableStore<V> {
    /// Gets a clone of a live entry's value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the key is not live, even when it
    /// still sits in the expired bucket.
    pub fn get<K: IntoKey>(&self, key: K) -> Result<V> {
        self.engine.get(&key.into_key()?)
    }

    /// Calls `visit` for every live entry.
    ///
    /// Iterates a snapshot taken at call time, so `visit` may use the store.
    pub fn for_each_live<F: FnMut(&Key, &V)>(&self, mut visit: F) {
        for (key, value) in self.engine.snapshot_live() {
            visit(&key, &value);
        }
    }

    /// Calls `visit` for every entry awaiting cleanup, over a snapshot.
    pub fn for_each_expired<F: FnMut(&Key, &V)>(&self, mut visit: F) {
        for (key, value) in self.engine.snapshot_expired() {
            visit(&key, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn config(lifespan_ms: u64, cleanup_ms: u64) -> StoreConfig {
        StoreConfig::new()
            .with_entry_lifespan(Duration::from_millis(lifespan_ms))
            .with_cleanup_interval(Duration::from_millis(cleanup_ms))
    }

    #[test]
    fn test_requires_runtime() {
        let result = ExpirableStore::<u32>::new(StoreConfig::default());
        assert_eq!(result.unwrap_err(), StoreError::NoRuntime);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_aborts_construction() {
        let config = StoreConfig::new()
            .with_expiry_check_interval(Duration::from_millis(100))
            .with_cleanup_interval(Duration::from_millis(500));
        let result = ExpirableStore::<u32>::new(config);
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_expiring_lifespan_constructs() {
        let store = ExpirableStore::new(StoreConfig::new().with_entry_lifespan(Duration::MAX))
            .unwrap();
        store.add("forever", 1).unwrap();

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(store.contains("forever"));
        assert_eq!(store.settings().expiry_check_interval, Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_get_remove() {
        let store = ExpirableStore::new(config(1000, 5000)).unwrap();

        assert_ok!(store.add("abc", 1));
        assert_ok!(store.add(12345, 2));
        assert_ok!(store.add(true, 3));

        assert_eq!(store.get("abc"), Ok(1));
        assert_eq!(store.get(12345), Ok(2));
        assert_eq!(store.get(true), Ok(3));
        assert_eq!(store.len(), 3);

        assert_eq!(store.remove("abc"), Ok(true));
        assert_eq!(store.remove("abc"), Ok(false));
        assert_err!(store.get("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_composite_key_rejected() {
        let store = ExpirableStore::new(config(1000, 5000)).unwrap();
        store.add("keep", 1).unwrap();

        let result = store.add(vec![1, 2], 2);
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
        assert_eq!(store.live_keys(), vec![Key::Str("keep".into())]);
        assert!(!store.contains(vec![1, 2]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_entry_lifespan() {
        let store = ExpirableStore::new(config(1000, 5000)).unwrap();
        store
            .add_with_lifespan("short", 1, Duration::from_millis(200))
            .unwrap();
        store.add("default", 2).unwrap();

        // passes at 1001ms
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(store.is_expired("short"));
        assert!(store.is_expired("default"));

        store
            .add_with_lifespan("long", 3, Duration::from_millis(3000))
            .unwrap();
        // passes at 2002ms, 3003ms
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(store.contains("long"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_life_tracks_age() {
        let store = ExpirableStore::new(config(1000, 5000)).unwrap();
        store.add("k", ()).unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        let age = store.life("k").unwrap();
        assert!(age >= Duration::from_millis(300) && age < Duration::from_millis(305));

        store.delay_expiry("k", false).unwrap();
        assert_eq!(store.life("k"), Ok(Duration::ZERO));

        assert_eq!(
            store.life("missing"),
            Err(StoreError::NotFound(Key::Str("missing".into())))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_when_running_is_noop() {
        let expirations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&expirations);
        let hooks = Hooks::new().on_expiry(move |_: &Key, _: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let store = ExpirableStore::with_hooks(config(1000, 5000), hooks).unwrap();

        store.add_with_lifespan("k", 1, Duration::ZERO).unwrap();
        store.resume();
        assert_eq!(expirations.load(Ordering::SeqCst), 0);
        assert!(store.contains("k"));

        store.pause();
        store.resume();
        assert_eq!(expirations.load(Ordering::SeqCst), 1);
        assert!(store.is_expired("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_for_each_snapshot_allows_mutation() {
        let store = ExpirableStore::new(config(1000, 5000)).unwrap();
        store.add("a", 1).unwrap();
        store.add("b", 2).unwrap();

        let mut total = 0;
        store.for_each_live(|key, value| {
            total += *value;
            store.remove(key.clone()).unwrap();
        });

        assert_eq!(total, 3);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_scan_and_clean() {
        let store = ExpirableStore::new(config(1000, 5000)).unwrap();
        store.stop();
        assert!(store.is_stopped());

        store.add_with_lifespan("k", 1, Duration::ZERO).unwrap();
        assert_eq!(store.scan(), 1);

        let mut expired = Vec::new();
        store.for_each_expired(|key, value| expired.push((key.clone(), *value)));
        assert_eq!(expired, vec![(Key::Str("k".into()), 1)]);

        assert_eq!(store.clean(), 1);
        assert_eq!(store.expired_len(), 0);
        assert_eq!(store.stats().flushes, 1);
    }
}
