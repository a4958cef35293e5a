//! Thread-safe weak-value object cache.
//!
//! Deduplicates immutable device objects (samplers, signatures) by
//! description. The registry holds objects weakly: dropping the last
//! external strong reference lets the object die, and the dead entry is
//! swept out lazily.
//!
//! Locking protocol: the map mutex guards only wrapper lookup/insert and is
//! held for O(1) critical sections. Each wrapper carries its own mutex
//! around the weak slot, so concurrent `get_or_create` calls for the *same*
//! key serialize construction while different keys never wait on each
//! other's factories.

use fxhash::FxHashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Number of requests between automatic purge sweeps.
const DEFAULT_PURGE_INTERVAL: usize = 1024;

struct Entry<V> {
    slot: Mutex<Weak<V>>,
}

impl<V> Entry<V> {
    fn new() -> Entry<V> {
        Entry {
            slot: Mutex::new(Weak::new()),
        }
    }
}

pub struct ObjectsRegistry<K, V> {
    map: Mutex<FxHashMap<K, Arc<Entry<V>>>>,
    requests: AtomicUsize,
    purge_interval: usize,
}

impl<K: Eq + Hash + Clone, V> ObjectsRegistry<K, V> {
    pub fn new() -> ObjectsRegistry<K, V> {
        ObjectsRegistry::with_purge_interval(DEFAULT_PURGE_INTERVAL)
    }

    pub fn with_purge_interval(purge_interval: usize) -> ObjectsRegistry<K, V> {
        assert!(purge_interval > 0, "purge interval must be non-zero");
        ObjectsRegistry {
            map: Mutex::new(FxHashMap::default()),
            requests: AtomicUsize::new(0),
            purge_interval,
        }
    }

    /// Returns the cached object for `key`, constructing it with `factory`
    /// if absent or expired.
    ///
    /// At most one concurrent `factory` invocation runs per key. When two
    /// callers race before either has populated the slot, exactly one
    /// factory result is retained; the loser's object is discarded rather
    /// than retried into the cache. A factory error propagates only to the
    /// caller that ran it, unless a racing creator has succeeded in the
    /// meantime, in which case that success is returned instead.
    pub fn get_or_create<E>(
        &self,
        key: K,
        factory: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<Arc<V>, E> {
        self.count_request();

        let entry = {
            let mut map = self.map.lock().unwrap();
            map.entry(key.clone()).or_insert_with(|| Arc::new(Entry::new())).clone()
        };

        {
            let mut slot = entry.slot.lock().unwrap();
            if let Some(obj) = slot.upgrade() {
                return Ok(obj);
            }
            match factory() {
                Ok(obj) => {
                    let obj = Arc::new(obj);
                    *slot = Arc::downgrade(&obj);
                    return Ok(obj);
                }
                Err(err) => {
                    drop(slot);
                    // A racing creator may have replaced the wrapper and
                    // populated it while we were failing; keep its success.
                    let mut map = self.map.lock().unwrap();
                    if let Some(current) = map.get(&key) {
                        if let Some(obj) = current.slot.lock().unwrap().upgrade() {
                            return Ok(obj);
                        }
                        if Arc::ptr_eq(current, &entry) {
                            map.remove(&key);
                        }
                    }
                    Err(err)
                }
            }
        }
    }

    /// Returns the cached object for `key` if present and still alive.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.count_request();
        let entry = self.map.lock().unwrap().get(key).cloned()?;
        let obj = entry.slot.lock().unwrap().upgrade();
        obj
    }

    /// Removes entries whose object has expired.
    ///
    /// Entries whose slot lock is held are under construction and therefore
    /// not expired; the sweep skips them instead of waiting, so a slow
    /// factory never stalls unrelated keys behind the map lock.
    pub fn purge(&self) {
        let mut map = self.map.lock().unwrap();
        map.retain(|_, entry| match entry.slot.try_lock() {
            Ok(slot) => slot.upgrade().is_some(),
            Err(_) => true,
        });
    }

    /// Removes all entries, live or not. Outstanding strong references
    /// remain valid; their objects are simply no longer deduplicated.
    pub fn clear(&self) {
        self.map.lock().unwrap().clear();
    }

    /// Calls `handler` for every live element under the map lock. Elements
    /// still under construction are skipped.
    pub fn process_elements(&self, mut handler: impl FnMut(&K, &Arc<V>)) {
        let map = self.map.lock().unwrap();
        for (key, entry) in map.iter() {
            if let Ok(slot) = entry.slot.try_lock() {
                if let Some(obj) = slot.upgrade() {
                    handler(key, &obj);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().unwrap().is_empty()
    }

    fn count_request(&self) {
        let n = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.purge_interval == 0 {
            self.purge();
        }
    }
}

impl<K: Eq + Hash + Clone, V> Default for ObjectsRegistry<K, V> {
    fn default() -> Self {
        ObjectsRegistry::new()
    }
}

//--------------------------------------------------------------------------------------------------
