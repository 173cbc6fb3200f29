//! Durable key-value backends for the guest store.
//!
//! The guest store persists three JSON documents (profile, notes, reminders)
//! under fixed keys. Backends only move bytes; they never interpret them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use driftnote_core::{Error, Result};

/// Storage backend trait for different storage implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing was written.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value under `key`. A crash mid-write must leave either the
    /// old or the new value, never a torn one.
    async fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid storage key '{key}'")))
    }
}

// =============================================================================
// FILESYSTEM
// =============================================================================

/// Filesystem storage backend.
///
/// Each key is one file: `{base_path}/{key}.json`.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let full_path = self.full_path(key);
        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        validate_key(key)?;
        let full_path = self.full_path(key);
        debug!(key, full_path = %full_path.display(), size = data.len(), "guest storage: write");

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(base_path = %self.base_path.display(), error = %e, "guest storage: create_dir_all failed");
            e
        })?;

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "guest storage: File::create failed");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "guest storage: rename failed");
            e
        })?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match fs::remove_file(self.full_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-memory backend for tests and ephemeral sessions.
///
/// Clones share the same map, so dropping a store and opening a new one over
/// a clone behaves like an app restart.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write and delete fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw bytes under `key`, for assertions.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding this lock can only come from a test thread.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory backend write failure",
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.lock().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.lock().remove(key);
        Ok(())
    }
}
