//! Structured logging schema and field name constants for driftnote.
//!
//! All crates use these constants for consistent structured logging fields,
//! so a log pipeline can filter a migration or a mode transition by the same
//! field names regardless of which crate emitted the event.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Local data at risk (clear failed, persist failed) |
//! | WARN  | Recoverable issue: failed batch, aborted migration, ignored event |
//! | INFO  | Mode transitions, migration start/finish, profile lifecycle |
//! | DEBUG | Decision points: quota checks, verification attempts, dispatch target |
//! | TRACE | Per-record iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "local", "session", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "guest_store", "mode_controller", "migration"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_note", "on_signed_in", "bulk_insert_notes"
pub const OPERATION: &str = "op";

/// Authenticated identity the operation runs under.
pub const IDENTITY_ID: &str = "identity_id";

/// Guest profile id.
pub const PROFILE_ID: &str = "profile_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note record id (`origin:uuid`).
pub const NOTE_ID: &str = "note_id";

/// Reminder record id (`origin:uuid`).
pub const REMINDER_ID: &str = "reminder_id";

/// Storage key touched by a backend operation.
pub const STORAGE_KEY: &str = "key";

// ─── State fields ──────────────────────────────────────────────────────────

/// Current mode state.
pub const MODE: &str = "mode";

/// Mode before a transition.
pub const FROM_MODE: &str = "from";

/// Mode after a transition.
pub const TO_MODE: &str = "to";

// ─── Migration fields ──────────────────────────────────────────────────────

/// Zero-based index of a note batch.
pub const BATCH_INDEX: &str = "batch_index";

/// Number of records in a batch.
pub const BATCH_SIZE: &str = "batch_size";

/// One-based verification attempt number.
pub const ATTEMPT: &str = "attempt";

/// Notes successfully transferred so far.
pub const NOTES_MIGRATED: &str = "notes_migrated";

/// Reminders successfully transferred.
pub const REMINDERS_MIGRATED: &str = "reminders_migrated";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned or affected.
pub const RESULT_COUNT: &str = "result_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
