//! # driftnote-session
//!
//! Decides which backend owns truth for the running application and moves a
//! guest's data into their new account exactly once.
//!
//! This crate provides:
//! - [`ModeController`]: the guest/account state machine and the unified CRUD API
//! - [`MigrationEngine`]: the settle-verify-batch-retire migration procedure
//! - [`mock`]: deterministic remote store and auth doubles for tests
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use driftnote_session::{MigrationConfig, ModeController};
//! use driftnote_local::GuestStoreConfig;
//!
//! let store = Arc::new(GuestStoreConfig::from_env().open());
//! let controller = Arc::new(ModeController::new(store, remote, auth, MigrationConfig::from_env()));
//! controller.resolve_initial_state().await?;
//!
//! // Wire the auth provider's event stream
//! let pump = controller.clone();
//! tokio::spawn(async move { pump.run_auth_events(auth_events).await });
//!
//! let note = controller.create_note(CreateNoteRequest::text("Idea", "...")).await?;
//! ```

pub mod controller;
pub mod migration;
pub mod mock;

// Re-export core types
pub use driftnote_core::*;

pub use controller::{ModeController, Transition};
pub use migration::{MigrationConfig, MigrationEngine};
