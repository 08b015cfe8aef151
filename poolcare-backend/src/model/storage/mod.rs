///! Key-value persistence
///!
///! Layers, leaf first:
///! - `KeyValueStore`: physical string store (`MemoryStore`, `FileStore`)
///! - `NamespacedStore`: prefix-partitioned JSON view, fail-soft
///! - `TtlCache`: expiring entries with lazy eviction
///! - `migrate` / `migrate_staged`: bulk copy between namespaced stores

mod kv;
pub use kv::{KeyValueStore, MemoryStore, StorageError};

mod file_store;
pub use file_store::FileStore;

mod namespaced;
pub use namespaced::{ImportMode, NamespacedStore};

mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

mod ttl_cache;
pub use ttl_cache::{DEFAULT_CACHE_NAMESPACE, DEFAULT_TTL_MS, TtlCache};

mod migration;
pub use migration::{migrate, migrate_staged};
