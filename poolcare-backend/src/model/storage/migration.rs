use serde_json::Value;
use tracing::{error, info, warn};

use super::kv::KeyValueStore;
use super::namespaced::NamespacedStore;

/// Copy entries from one namespaced store to another.
///
/// Copies every entry, or only `keys` when given (keys missing from the
/// source are skipped). Not atomic: the first failed write stops the copy
/// and returns `false`, leaving already-written entries in place.
pub fn migrate<A, B>(from: &NamespacedStore<A>, to: &NamespacedStore<B>, keys: Option<&[&str]>) -> bool
where
    A: KeyValueStore,
    B: KeyValueStore,
{
    let Some(entries) = select_entries(from, keys) else {
        error!(
            "Migration {} -> {} aborted: source could not be read",
            from.namespace(),
            to.namespace()
        );
        return false;
    };
    let total = entries.len();

    for (index, (key, value)) in entries.iter().enumerate() {
        if !to.set(key, value) {
            error!(
                "Migration {} -> {} failed at '{}' after {}/{} entries",
                from.namespace(),
                to.namespace(),
                key,
                index,
                total
            );
            return false;
        }
    }

    info!(
        "Migrated {} entries from '{}' to '{}'",
        total,
        from.namespace(),
        to.namespace()
    );
    true
}

/// Two-phase variant of [`migrate`]: all-or-nothing from the target's view.
///
/// Reads everything first, remembers the target's previous stored strings,
/// then writes. On any failed write every key already written is restored
/// byte for byte (or removed if it did not exist).
pub fn migrate_staged<A, B>(
    from: &NamespacedStore<A>,
    to: &NamespacedStore<B>,
    keys: Option<&[&str]>,
) -> bool
where
    A: KeyValueStore,
    B: KeyValueStore,
{
    let Some(entries) = select_entries(from, keys) else {
        error!(
            "Staged migration {} -> {} aborted: source could not be read",
            from.namespace(),
            to.namespace()
        );
        return false;
    };

    let previous: Vec<Option<String>> = match entries
        .iter()
        .map(|(key, _)| to.get_raw(key))
        .collect::<Result<_, _>>()
    {
        Ok(previous) => previous,
        Err(e) => {
            error!(
                "Staged migration {} -> {} aborted: target could not be read: {}",
                from.namespace(),
                to.namespace(),
                e
            );
            return false;
        }
    };

    for (index, (key, value)) in entries.iter().enumerate() {
        if to.set(key, value) {
            continue;
        }

        error!(
            "Staged migration {} -> {} failed at '{}', rolling back {} writes",
            from.namespace(),
            to.namespace(),
            key,
            index
        );

        for ((key, _), old) in entries.iter().zip(previous.iter()).take(index) {
            let restored = match old {
                Some(raw) => to.set_raw(key, raw).is_ok(),
                None => to.remove(key),
            };
            if !restored {
                warn!("Rollback could not restore '{}' in '{}'", key, to.namespace());
            }
        }
        return false;
    }

    info!(
        "Staged migration copied {} entries from '{}' to '{}'",
        entries.len(),
        from.namespace(),
        to.namespace()
    );
    true
}

fn select_entries<S: KeyValueStore>(
    from: &NamespacedStore<S>,
    keys: Option<&[&str]>,
) -> Option<Vec<(String, Value)>> {
    let mut all = from.try_get_all()?;

    let entries = match keys {
        None => all.into_iter().collect(),
        Some(keys) => keys
            .iter()
            .filter_map(|key| match all.remove(*key) {
                Some(value) => Some((key.to_string(), value)),
                None => {
                    warn!("Key '{}' not found in '{}', skipping", key, from.namespace());
                    None
                }
            })
            .collect(),
    };
    Some(entries)
}
