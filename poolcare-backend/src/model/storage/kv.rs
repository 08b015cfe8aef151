use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Errors reported by a physical key-value backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {used} of {limit} bytes")]
    QuotaExceeded { used: usize, limit: usize },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Minimal synchronous string-keyed, string-valued store.
///
/// Mirrors the browser storage surface: `getItem`, `setItem`, `removeItem`,
/// `key(index)` and `length`. Methods take `&self`; backends handle their
/// own interior mutability so one store can be shared by several namespaces.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Key at `index` in the store's enumeration order
    fn key(&self, index: usize) -> Result<Option<String>, StorageError>;

    fn length(&self) -> Result<usize, StorageError>;

    /// Every physical key, collected before the caller mutates anything
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let length = self.length()?;
        let mut keys = Vec::with_capacity(length);
        for index in 0..length {
            if let Some(key) = self.key(index)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn key(&self, index: usize) -> Result<Option<String>, StorageError> {
        (**self).key(index)
    }

    fn length(&self) -> Result<usize, StorageError> {
        (**self).length()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn key(&self, index: usize) -> Result<Option<String>, StorageError> {
        (**self).key(index)
    }

    fn length(&self) -> Result<usize, StorageError> {
        (**self).length()
    }
}

/// In-memory store with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push keys plus values past `limit` bytes
    pub fn with_quota(limit: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(limit),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.items.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.lock()?;

        if let Some(limit) = self.quota_bytes {
            let current: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let used = current + key.len() + value.len();
            if used > limit {
                return Err(StorageError::QuotaExceeded { used, limit });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn key(&self, index: usize) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.keys().nth(index).cloned())
    }

    fn length(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_operations() {
        let store = MemoryStore::new();
        store.set_item("b", "2").unwrap();
        store.set_item("a", "1").unwrap();

        assert_eq!(store.get_item("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.length().unwrap(), 2);
        assert_eq!(store.key(0).unwrap(), Some("a".to_string()));
        assert_eq!(store.key(2).unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
        // Removing a missing key is not an error
        store.remove_item("a").unwrap();
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(10);
        store.set_item("k", "12345").unwrap();

        let err = store.set_item("other", "123456").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));

        // Overwriting an existing key only counts the new value
        store.set_item("k", "123456789").unwrap();
    }

    #[test]
    fn test_shared_handles_see_same_data() {
        let store = Arc::new(MemoryStore::new());
        let handle = store.clone();
        handle.set_item("x", "y").unwrap();
        assert_eq!((&*store).get_item("x").unwrap(), Some("y".to_string()));
    }
}
