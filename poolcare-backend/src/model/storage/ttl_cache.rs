use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::kv::KeyValueStore;
use super::namespaced::NamespacedStore;

/// Namespace used when the caller does not pick one
pub const DEFAULT_CACHE_NAMESPACE: &str = "cache";

/// One hour
pub const DEFAULT_TTL_MS: i64 = 3_600_000;

/// Persisted wrapper around a cached value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CacheItem<T> {
    value: T,
    /// Unix milliseconds
    expires: i64,
}

/// Expiring cache over a `NamespacedStore`.
///
/// There is no background eviction: expired entries stay in storage until
/// they are read or `clear_expired` sweeps them.
pub struct TtlCache<S: KeyValueStore, C: Clock = SystemClock> {
    store: NamespacedStore<S>,
    clock: C,
}

impl<S: KeyValueStore> TtlCache<S, SystemClock> {
    /// Cache in the default `cache` namespace using wall-clock time
    pub fn new(store: S) -> Self {
        Self::with_clock(NamespacedStore::new(store, DEFAULT_CACHE_NAMESPACE), SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> TtlCache<S, C> {
    pub fn with_clock(store: NamespacedStore<S>, clock: C) -> Self {
        Self { store, clock }
    }

    /// The backing namespaced store
    pub fn store(&self) -> &NamespacedStore<S> {
        &self.store
    }

    /// Store `value` for the default TTL of one hour
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        self.set_with_ttl(key, value, DEFAULT_TTL_MS)
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl_ms: i64) -> bool {
        let item = CacheItem {
            value,
            expires: self.clock.now_ms().saturating_add(ttl_ms),
        };
        self.store.set(key, &item)
    }

    /// Live value for `key`; an expired entry is deleted and reported as a miss
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let item: CacheItem<Value> = self.store.get(key, None)?;

        if self.is_expired(item.expires) {
            debug!("[{}] Evicting expired '{}'", self.store.namespace(), key);
            self.store.remove(key);
            return None;
        }

        match serde_json::from_value(item.value) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("[{}] Cached '{}' has another type: {}", self.store.namespace(), key, e);
                None
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get::<Value>(key).is_some()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.store.remove(key)
    }

    pub fn clear(&self) -> bool {
        self.store.clear()
    }

    /// Evict every expired entry and return how many were expired.
    ///
    /// Entries that are not cache items are removed but not counted.
    pub fn clear_expired(&self) -> usize {
        let mut expired = 0;

        for key in self.store.get_all_keys() {
            match self.store.get::<Option<CacheItem<Value>>>(&key, None) {
                Some(item) if self.is_expired(item.expires) => {
                    if self.store.remove(&key) {
                        expired += 1;
                    }
                }
                Some(_) => {}
                None => {
                    debug!("[{}] Removing malformed entry '{}'", self.store.namespace(), key);
                    self.store.remove(&key);
                }
            }
        }

        if expired > 0 {
            debug!("[{}] Swept {} expired entries", self.store.namespace(), expired);
        }
        expired
    }

    fn is_expired(&self, expires: i64) -> bool {
        self.clock.now_ms() > expires
    }
}
