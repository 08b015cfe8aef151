use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::kv::{KeyValueStore, StorageError};

/// Key-value store persisted as a single JSON object on disk.
///
/// The whole map is loaded on open and rewritten after every mutation.
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`; a missing file starts an empty store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let items = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("Store file does not exist yet: {:?}", path);
            BTreeMap::new()
        };

        info!("Opened store {:?} with {} entries", path, items.len());

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.items.lock().map_err(|_| StorageError::Poisoned)
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(items)?;

        // Sibling file, then rename over the store
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.lock()?;
        let previous = items.insert(key.to_string(), value.to_string());

        if let Err(e) = self.flush(&items) {
            // Keep memory consistent with disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.lock()?;
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.flush(&items) {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn key(&self, index: usize) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.keys().nth(index).cloned())
    }

    fn length(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}
