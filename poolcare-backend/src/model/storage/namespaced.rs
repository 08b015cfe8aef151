use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::kv::{KeyValueStore, StorageError};

/// How `import` treats keys already in the namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Overwrite keys present in the payload, keep the rest
    Merge,
    /// Clear the namespace before writing the payload
    Replace,
}

/// A logical store occupying `"<namespace>:"`-prefixed keys of a physical store.
///
/// Every operation is fail-soft: underlying errors are logged and reported
/// as `false`, the caller's default, or an empty collection.
pub struct NamespacedStore<S: KeyValueStore> {
    store: S,
    namespace: String,
    prefix: String,
}

impl<S: KeyValueStore> NamespacedStore<S> {
    pub fn new(store: S, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let prefix = format!("{}:", namespace);
        Self {
            store,
            namespace,
            prefix,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The wrapped physical store
    pub fn inner(&self) -> &S {
        &self.store
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Serialize `value` as JSON under `key`
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("[{}] Failed to serialize value for '{}': {}", self.namespace, key, e);
                return false;
            }
        };

        match self.store.set_item(&self.physical_key(key), &json) {
            Ok(()) => true,
            Err(e) => {
                warn!("[{}] Failed to write '{}': {}", self.namespace, key, e);
                false
            }
        }
    }

    /// Read `key`, falling back to `default` when missing or undeserializable
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.store.get_item(&self.physical_key(key)) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("[{}] Failed to parse '{}': {}", self.namespace, key, e);
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("[{}] Failed to read '{}': {}", self.namespace, key, e);
                default
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.store.remove_item(&self.physical_key(key)) {
            Ok(()) => true,
            Err(e) => {
                warn!("[{}] Failed to remove '{}': {}", self.namespace, key, e);
                false
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        match self.store.get_item(&self.physical_key(key)) {
            Ok(value) => value.is_some(),
            Err(e) => {
                warn!("[{}] Failed to check '{}': {}", self.namespace, key, e);
                false
            }
        }
    }

    /// Remove every key in this namespace; other namespaces are untouched
    pub fn clear(&self) -> bool {
        let keys = match self.physical_keys() {
            Some(keys) => keys,
            None => return false,
        };

        let mut ok = true;
        for key in &keys {
            if let Err(e) = self.store.remove_item(key) {
                warn!("[{}] Failed to remove '{}' during clear: {}", self.namespace, key, e);
                ok = false;
            }
        }

        debug!("[{}] Cleared {} keys", self.namespace, keys.len());
        ok
    }

    /// Logical keys in this namespace, prefix stripped
    pub fn get_all_keys(&self) -> Vec<String> {
        self.physical_keys()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }

    /// Every entry in this namespace as parsed JSON; unparseable entries are skipped
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        let mut entries = BTreeMap::new();
        for key in self.get_all_keys() {
            match self.store.get_item(&self.physical_key(&key)) {
                Ok(Some(raw)) => match serde_json::from_str(&raw) {
                    Ok(value) => {
                        entries.insert(key, value);
                    }
                    Err(e) => warn!("[{}] Skipping unparseable '{}': {}", self.namespace, key, e),
                },
                Ok(None) => {}
                Err(e) => warn!("[{}] Failed to read '{}': {}", self.namespace, key, e),
            }
        }
        entries
    }

    /// Strict variant of `get_all`: `None` if any key cannot be listed, read or parsed
    pub(crate) fn try_get_all(&self) -> Option<BTreeMap<String, Value>> {
        let mut entries = BTreeMap::new();
        for physical in self.physical_keys()? {
            let Some(key) = physical.strip_prefix(&self.prefix) else {
                continue;
            };
            let raw = match self.store.get_item(&physical) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!("[{}] Failed to read '{}': {}", self.namespace, key, e);
                    return None;
                }
            };
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    entries.insert(key.to_string(), value);
                }
                Err(e) => {
                    warn!("[{}] Unparseable entry '{}': {}", self.namespace, key, e);
                    return None;
                }
            }
        }
        Some(entries)
    }

    /// Stored string for `key`, bypassing JSON decoding
    pub(crate) fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get_item(&self.physical_key(key))
    }

    pub(crate) fn set_raw(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        self.store.set_item(&self.physical_key(key), raw)
    }

    /// The whole namespace as one JSON object, prefix stripped
    pub fn export(&self) -> String {
        let entries: Map<String, Value> = self.get_all().into_iter().collect();
        serde_json::to_string_pretty(&Value::Object(entries)).unwrap_or_else(|e| {
            warn!("[{}] Failed to serialize export: {}", self.namespace, e);
            "{}".to_string()
        })
    }

    /// Load a JSON object produced by `export`
    pub fn import(&self, json: &str, mode: ImportMode) -> bool {
        let entries = match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) => {
                warn!("[{}] Import payload must be a JSON object", self.namespace);
                return false;
            }
            Err(e) => {
                warn!("[{}] Failed to parse import payload: {}", self.namespace, e);
                return false;
            }
        };

        if mode == ImportMode::Replace && !self.clear() {
            return false;
        }

        let mut ok = true;
        for (key, value) in &entries {
            ok &= self.set(key, value);
        }

        debug!("[{}] Imported {} entries ({:?})", self.namespace, entries.len(), mode);
        ok
    }

    fn physical_keys(&self) -> Option<Vec<String>> {
        match self.store.keys() {
            Ok(keys) => Some(
                keys.into_iter()
                    .filter(|key| key.starts_with(&self.prefix))
                    .collect(),
            ),
            Err(e) => {
                warn!("[{}] Failed to enumerate keys: {}", self.namespace, e);
                None
            }
        }
    }
}
