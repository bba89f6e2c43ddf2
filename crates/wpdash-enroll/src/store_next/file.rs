//! JSON document load/save for the file store.
//!
//! Every operation runs under the document's lock file: shared for reads,
//! exclusive for read-modify-write. These are blocking calls; the store
//! runs them on the blocking pool.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{StoreError, StoreResult};

use super::io;

pub(crate) type Entries = BTreeMap<String, String>;

pub(crate) fn load_impl(path: &Path) -> StoreResult<Entries> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(StoreError::Unavailable {
                message: format!("failed to read {}: {}", path.display(), e),
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
        message: format!("failed to parse {}: {}", path.display(), e),
    })
}

pub(crate) fn save_impl(path: &Path, entries: &Entries) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Unavailable {
        message: format!("failed to serialize store: {}", e),
    })?;
    io::write_atomic_impl(path, &json)
}

/// Load under a shared lock.
pub(crate) fn read_locked_impl(path: &Path) -> StoreResult<Entries> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let _lock = io::lock_impl(path, false)?;
    load_impl(path)
}

/// Load, apply `update` and save, all under the exclusive lock.
///
/// `update` returns its result and whether the document changed; unchanged
/// documents are not rewritten.
pub(crate) fn update_locked_impl<T>(
    path: &Path,
    update: impl FnOnce(&mut Entries) -> (T, bool),
) -> StoreResult<T> {
    let _lock = io::lock_impl(path, true)?;
    let mut entries = load_impl(path)?;
    let (result, changed) = update(&mut entries);
    if changed {
        save_impl(path, &entries)?;
    }
    Ok(result)
}
