//! Durable key-value persistence for enrollment state.
//!
//! The enrollment service only needs string get/set. Backends must apply a
//! [`KeyStore::set_all`] batch atomically and implement
//! [`KeyStore::set_if_absent`] as a compare-and-set.
//!
//! # File layout
//!
//! ```text
//! <data dir>/wpdash/child-options.json
//! {
//!   "mainwp_child_pubkey": "...",
//!   "mainwp_child_sshkey": "...",
//!   "mainwp_child_sshtime": "2024-03-09 07:05:01",
//!   "mainwp_child_uniqueId": "..."
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

#[path = "store_next/mod.rs"]
mod store_next;

/// Original public key as received, transport-encoded.
pub const PUBLIC_KEY: &str = "mainwp_child_pubkey";

/// Derived OpenSSH artifact, transport-encoded.
pub const SSH_KEY: &str = "mainwp_child_sshkey";

/// Artifact creation time, `%Y-%m-%d %H:%M:%S` UTC.
pub const SSH_TIME: &str = "mainwp_child_sshtime";

/// Pairing secret ("security ID").
pub const SECURITY_ID: &str = "mainwp_child_uniqueId";

/// Durable string key-value store supplied by the host environment.
#[async_trait]
pub trait KeyStore: Send + Sync + std::fmt::Debug {
    /// Read a value. Absence is not an error.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Read several values from one consistent snapshot.
    async fn get_all(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>>;

    /// Write all entries as one atomic batch, in order.
    ///
    /// Either every entry is visible afterwards or none is.
    async fn set_all(&self, entries: &[(&str, &str)]) -> StoreResult<()>;

    /// Store `value` unless `key` already holds a non-empty value; return
    /// the stored value. An empty stored value counts as absent.
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<String>;
}

#[async_trait]
impl<T: KeyStore + ?Sized> KeyStore for Arc<T> {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn get_all(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>> {
        (**self).get_all(keys).await
    }

    async fn set_all(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        (**self).set_all(entries).await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<String> {
        (**self).set_if_absent(key, value).await
    }
}

/// In-process store, used by tests and embedders with their own persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_all(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>> {
        let inner = self.entries.read().await;
        Ok(keys.iter().map(|key| inner.get(*key).cloned()).collect())
    }

    async fn set_all(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        let mut inner = self.entries.write().await;
        for (key, value) in entries {
            inner.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<String> {
        let mut inner = self.entries.write().await;
        match inner.get(key).filter(|v| !v.is_empty()) {
            Some(existing) => Ok(existing.clone()),
            None => {
                inner.insert(key.to_string(), value.to_string());
                Ok(value.to_string())
            }
        }
    }
}

/// JSON document on disk, rewritten atomically on every change.
///
/// Writers are serialized through an advisory lock on `<document>.lock`,
/// so separate processes sharing the document see a consistent
/// compare-and-set. The document is replaced via a unique temp file and a
/// rename, so readers never see a partial write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at the default location.
    ///
    /// Default: `<data dir>/wpdash/child-options.json`
    pub fn new() -> StoreResult<Self> {
        Ok(Self::with_path(store_next::io::default_store_path_impl()?))
    }

    /// Store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> StoreResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || op(&path))
            .await
            .map_err(|e| StoreError::Unavailable {
                message: format!("file store task failed: {}", e),
            })?
    }
}

#[async_trait]
impl KeyStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.blocking(store_next::file::read_locked_impl).await?;
        let value = entries.get(key).cloned();
        debug!(key, hit = value.is_some(), "file store read");
        Ok(value)
    }

    async fn get_all(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>> {
        let entries = self.blocking(store_next::file::read_locked_impl).await?;
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    async fn set_all(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        let batch: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let count = batch.len();

        self.blocking(move |path| {
            store_next::file::update_locked_impl(path, |current| {
                current.extend(batch);
                ((), true)
            })
        })
        .await?;

        debug!(count, "file store batch written");
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<String> {
        let key_owned = key.to_string();
        let value = value.to_string();

        let (stored, created) = self
            .blocking(move |path| {
                store_next::file::update_locked_impl(path, |current| {
                    match current.get(&key_owned).filter(|v| !v.is_empty()) {
                        Some(existing) => ((existing.clone(), false), false),
                        None => {
                            current.insert(key_owned, value.clone());
                            ((value, true), true)
                        }
                    }
                })
            })
            .await?;

        if created {
            debug!(key, "file store value created");
        }
        Ok(stored)
    }
}
