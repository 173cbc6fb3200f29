//! # driftnote-local
//!
//! Durable storage for a single anonymous guest: one profile, an ordered list
//! of notes, and a list of reminders. No network access.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use driftnote_local::{FilesystemBackend, GuestStore};
//! use driftnote_core::{CreateNoteRequest, QuotaLimits};
//!
//! let backend = Arc::new(FilesystemBackend::new("/var/lib/driftnote/guest"));
//! let store = GuestStore::new(backend, QuotaLimits::default());
//! store.initialize().await?;
//! store.ensure_profile().await?;
//! let note = store.create_note(CreateNoteRequest::text("Groceries", "milk")).await?;
//! ```

pub mod backend;
pub mod config;
pub mod guest_store;

// Re-export core types
pub use driftnote_core::*;

pub use backend::{FilesystemBackend, MemoryBackend, StorageBackend};
pub use config::GuestStoreConfig;
pub use guest_store::GuestStore;
