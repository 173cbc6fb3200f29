//! Guest store configuration.

use std::path::PathBuf;
use std::sync::Arc;

use driftnote_core::{defaults, QuotaLimits};

use crate::backend::FilesystemBackend;
use crate::guest_store::GuestStore;

/// Configuration for a filesystem-backed guest store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestStoreConfig {
    /// Directory holding the guest JSON documents.
    pub data_dir: PathBuf,
    /// Guest quota.
    pub limits: QuotaLimits,
}

impl Default for GuestStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::GUEST_DATA_DIR),
            limits: QuotaLimits::default(),
        }
    }
}

impl GuestStoreConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DRIFTNOTE_DATA_DIR` | `.driftnote/guest` | Guest data directory |
    /// | `DRIFTNOTE_MAX_GUEST_NOTES` | `3` | See [`QuotaLimits::from_env`] |
    /// | `DRIFTNOTE_MAX_GUEST_REMINDERS` | `2` | See [`QuotaLimits::from_env`] |
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DRIFTNOTE_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::GUEST_DATA_DIR));

        Self {
            data_dir,
            limits: QuotaLimits::from_env(),
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_limits(mut self, limits: QuotaLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Build a guest store over a [`FilesystemBackend`] rooted at `data_dir`.
    pub fn open(&self) -> GuestStore {
        GuestStore::new(
            Arc::new(FilesystemBackend::new(self.data_dir.clone())),
            self.limits,
        )
    }
}
