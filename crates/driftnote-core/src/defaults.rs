//! Centralized default constants for driftnote.
//!
//! **This module is the single source of truth** for shared default values.
//! Config types in every crate start from these and only diverge through
//! explicit `with_*` setters or `DRIFTNOTE_*` environment variables.

use std::time::Duration;

// =============================================================================
// GUEST QUOTA
// =============================================================================

/// Maximum number of notes a guest may hold locally.
pub const MAX_GUEST_NOTES: usize = 3;

/// Maximum number of active reminders a guest may hold locally.
pub const MAX_GUEST_REMINDERS: usize = 2;

// =============================================================================
// MIGRATION
// =============================================================================

/// Delay before verifying the new session, in milliseconds.
///
/// The auth provider can report a sign-in before the backend accepts writes
/// under that identity.
pub const SESSION_SETTLE_MS: u64 = 2_000;

/// Number of times the current identity is queried before giving up.
pub const SESSION_VERIFY_ATTEMPTS: u32 = 3;

/// Fixed pause between identity verification attempts, in milliseconds.
pub const SESSION_VERIFY_BACKOFF_MS: u64 = 1_000;

/// Notes per remote bulk-insert call.
pub const MIGRATION_NOTE_BATCH_SIZE: usize = 10;

/// Settle wait as a [`Duration`].
pub const fn session_settle() -> Duration {
    Duration::from_millis(SESSION_SETTLE_MS)
}

/// Verification backoff as a [`Duration`].
pub const fn session_verify_backoff() -> Duration {
    Duration::from_millis(SESSION_VERIFY_BACKOFF_MS)
}

// =============================================================================
// LOCAL STORAGE
// =============================================================================

/// Storage key for the persisted guest profile.
pub const GUEST_PROFILE_KEY: &str = "guest_profile";

/// Storage key for the persisted guest notes list.
pub const GUEST_NOTES_KEY: &str = "guest_notes";

/// Storage key for the persisted guest reminders list.
pub const GUEST_REMINDERS_KEY: &str = "guest_reminders";

/// Default directory for the filesystem backend when none is configured.
pub const GUEST_DATA_DIR: &str = ".driftnote/guest";

// =============================================================================
// EVENTS
// =============================================================================

/// Default session event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 64;
