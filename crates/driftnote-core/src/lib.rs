//! # driftnote-core
//!
//! Core types, traits, and abstractions for driftnote guest mode.
//!
//! This crate provides the data model shared by the local guest store and the
//! session layer, the guest quota rules, and the interfaces of the external
//! collaborators (remote store, authentication observer, content analyzer).
//! Nothing in here performs I/O.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod quota;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, SessionEvent};
pub use models::*;
pub use quota::{check_quota, QuotaDecision, QuotaDenial, QuotaLimits, QuotaOperation, UsageCounters};
pub use traits::*;
