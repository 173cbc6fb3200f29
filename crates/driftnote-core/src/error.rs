//! Error types for driftnote.

use thiserror::Error;

use crate::models::{ModeState, RecordId};
use crate::quota::QuotaOperation;

/// Result type alias using driftnote's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for driftnote operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A guest create would exceed the fixed guest limit.
    #[error("Guest quota exceeded: at most {limit} {}", .kind.noun())]
    QuotaExceeded { kind: QuotaOperation, limit: usize },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found in the store that owns its id
    #[error("Note not found: {0}")]
    NoteNotFound(RecordId),

    /// Reminder not found in the store that owns its id
    #[error("Reminder not found: {0}")]
    ReminderNotFound(RecordId),

    /// Resource already exists (e.g. a second guest profile)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A mode transition is in progress; retry shortly
    #[error("Busy: a mode transition is in progress")]
    Busy,

    /// Migration aborted because the target identity never became current
    #[error("Session not established for {expected} (last observed: {})", .observed.as_deref().unwrap_or("none"))]
    SessionNotEstablished {
        expected: String,
        observed: Option<String>,
    },

    /// An auth event arrived in a mode that cannot accept it
    #[error("Invalid transition: {event} while {from}")]
    InvalidTransition { from: ModeState, event: String },

    /// Remote store call failed
    #[error("Remote error: {0}")]
    Remote(String),

    /// Authentication observer call failed
    #[error("Auth error: {0}")]
    Auth(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the transient error returned while a transition is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy)
    }

    /// True when a guest limit rejected the operation.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Error::QuotaExceeded { .. })
    }

    /// True for any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::NoteNotFound(_) | Error::ReminderNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_quota_exceeded_notes() {
        let err = Error::QuotaExceeded {
            kind: QuotaOperation::CreateNote,
            limit: 3,
        };
        assert_eq!(err.to_string(), "Guest quota exceeded: at most 3 notes");
    }

    #[test]
    fn test_error_display_quota_exceeded_reminders() {
        let err = Error::QuotaExceeded {
            kind: QuotaOperation::CreateReminder,
            limit: 2,
        };
        assert_eq!(err.to_string(), "Guest quota exceeded: at most 2 reminders");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = RecordId::guest(Uuid::nil());
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: guest:{}", Uuid::nil()));
    }

    #[test]
    fn test_error_display_busy() {
        assert_eq!(
            Error::Busy.to_string(),
            "Busy: a mode transition is in progress"
        );
    }

    #[test]
    fn test_error_display_session_not_established() {
        let err = Error::SessionNotEstablished {
            expected: "user-1".to_string(),
            observed: None,
        };
        assert_eq!(
            err.to_string(),
            "Session not established for user-1 (last observed: none)"
        );

        let err = Error::SessionNotEstablished {
            expected: "user-1".to_string(),
            observed: Some("user-2".to_string()),
        };
        assert!(err.to_string().ends_with("(last observed: user-2)"));
    }

    #[test]
    fn test_error_display_invalid_transition() {
        let err = Error::InvalidTransition {
            from: ModeState::Migrating,
            event: "signed_out".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid transition: signed_out while migrating");
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::Busy.is_busy());
        assert!(!Error::Busy.is_not_found());
        assert!(Error::NotFound("guest profile".into()).is_not_found());
        assert!(Error::ReminderNotFound(RecordId::remote(Uuid::nil())).is_not_found());
        assert!(Error::QuotaExceeded {
            kind: QuotaOperation::CreateNote,
            limit: 3
        }
        .is_quota_exceeded());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
