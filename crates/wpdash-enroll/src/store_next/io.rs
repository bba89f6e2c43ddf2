//! Filesystem helpers for the file store.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};

pub(crate) fn default_store_path_impl() -> StoreResult<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| StoreError::Unavailable {
            message: "could not determine data directory".to_string(),
        })?;

    Ok(base.join("wpdash").join("child-options.json"))
}

/// Directory holding the document (`.` for a bare file name).
pub(crate) fn parent_dir_impl(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Lock file guarding the document across processes.
pub(crate) fn lock_path_impl(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    parent_dir_impl(path).join(name)
}

/// Advisory lock held until the returned handle is dropped.
#[derive(Debug)]
pub(crate) struct StoreLock {
    _file: File,
}

pub(crate) fn lock_impl(path: &Path, exclusive: bool) -> StoreResult<StoreLock> {
    fs::create_dir_all(parent_dir_impl(path)).map_err(|e| StoreError::Unavailable {
        message: format!("failed to create store directory: {}", e),
    })?;

    let lock_path = lock_path_impl(path);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| StoreError::Unavailable {
            message: format!("failed to open lock file {}: {}", lock_path.display(), e),
        })?;

    let locked = if exclusive {
        FileExt::lock_exclusive(&file)
    } else {
        FileExt::lock_shared(&file)
    };
    locked.map_err(|e| StoreError::Unavailable {
        message: format!("failed to lock {}: {}", lock_path.display(), e),
    })?;

    Ok(StoreLock { _file: file })
}

/// Replace `path` with `content` via a uniquely named temp file in the same
/// directory.
pub(crate) fn write_atomic_impl(path: &Path, content: &str) -> StoreResult<()> {
    let dir = parent_dir_impl(path);
    fs::create_dir_all(&dir).map_err(|e| StoreError::Unavailable {
        message: format!("failed to create store directory: {}", e),
    })?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::Unavailable {
        message: format!("failed to create temp file: {}", e),
    })?;

    temp.write_all(content.as_bytes())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| StoreError::Unavailable {
            message: format!("failed to write temp file: {}", e),
        })?;

    temp.persist(path).map_err(|e| StoreError::Unavailable {
        message: format!("failed to replace {}: {}", path.display(), e.error),
    })?;

    Ok(())
}
