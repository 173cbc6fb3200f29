//! Core data models for driftnote.
//!
//! Guest and remote records share one shape. The store that owns a record is
//! carried in its [`RecordId`], so a guest id can never be mistaken for a
//! remote id.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// RECORD IDENTITY
// =============================================================================

/// Which persistence backend owns a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendOrigin {
    /// The on-device guest store.
    Guest,
    /// The authenticated remote store.
    Remote,
}

impl fmt::Display for BackendOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendOrigin::Guest => write!(f, "guest"),
            BackendOrigin::Remote => write!(f, "remote"),
        }
    }
}

/// Record id scoped to the backend that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub origin: BackendOrigin,
    pub id: Uuid,
}

impl RecordId {
    pub fn guest(id: Uuid) -> Self {
        Self {
            origin: BackendOrigin::Guest,
            id,
        }
    }

    pub fn remote(id: Uuid) -> Self {
        Self {
            origin: BackendOrigin::Remote,
            id,
        }
    }

    /// Fresh time-ordered guest id.
    pub fn new_guest() -> Self {
        Self::guest(Uuid::now_v7())
    }

    /// Fresh time-ordered remote id.
    pub fn new_remote() -> Self {
        Self::remote(Uuid::now_v7())
    }

    pub fn is_guest(&self) -> bool {
        self.origin == BackendOrigin::Guest
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.id)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    /// Parses `guest:<uuid>`, `remote:<uuid>`, or a bare uuid (taken as guest).
    fn from_str(s: &str) -> Result<Self> {
        let (origin, raw) = match s.split_once(':') {
            Some(("guest", rest)) => (BackendOrigin::Guest, rest),
            Some(("remote", rest)) => (BackendOrigin::Remote, rest),
            Some((other, _)) => {
                return Err(Error::InvalidInput(format!("unknown record origin '{other}'")))
            }
            None => (BackendOrigin::Guest, s),
        };
        let id = Uuid::parse_str(raw)
            .map_err(|e| Error::InvalidInput(format!("invalid record id '{s}': {e}")))?;
        Ok(Self { origin, id })
    }
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Kind of content a note was captured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Text,
    Url,
    File,
    Image,
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NoteType::Text => "text",
            NoteType::Url => "url",
            NoteType::File => "file",
            NoteType::Image => "image",
        };
        f.write_str(s)
    }
}

impl FromStr for NoteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(NoteType::Text),
            "url" => Ok(NoteType::Url),
            "file" => Ok(NoteType::File),
            "image" => Ok(NoteType::Image),
            other => Err(Error::InvalidInput(format!("unknown note type '{other}'"))),
        }
    }
}

/// A captured note, owned by exactly one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    pub title: String,
    pub original_content: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Build a new note from a create request.
    pub fn from_request(id: RecordId, req: CreateNoteRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: req.title,
            original_content: req.original_content,
            summary: req.summary,
            note_type: req.note_type,
            tags: req.tags,
            source_url: req.source_url,
            file_url: req.file_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, req: UpdateNoteRequest, now: DateTime<Utc>) {
        if let Some(title) = req.title {
            self.title = title;
        }
        if let Some(content) = req.original_content {
            self.original_content = content;
        }
        if let Some(summary) = req.summary {
            self.summary = summary;
        }
        if let Some(note_type) = req.note_type {
            self.note_type = note_type;
        }
        if let Some(tags) = req.tags {
            self.tags = tags;
        }
        if let Some(source_url) = req.source_url {
            self.source_url = Some(source_url);
        }
        if let Some(file_url) = req.file_url {
            self.file_url = Some(file_url);
        }
        self.updated_at = now;
    }
}

/// Request for creating a new note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub original_content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "type")]
    pub note_type: NoteType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl CreateNoteRequest {
    /// Plain text note with no summary or tags.
    pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            original_content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_type(mut self, note_type: NoteType) -> Self {
        self.note_type = note_type;
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// Partial note update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub original_content: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "type")]
    pub note_type: Option<NoteType>,
    pub tags: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub file_url: Option<String>,
}

impl UpdateNoteRequest {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// =============================================================================
// REMINDER TYPES
// =============================================================================

/// Reminder urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidInput(format!("unknown priority '{other}'"))),
        }
    }
}

/// A reminder, optionally pointing at a note.
///
/// `note_id` is a weak reference: the note may be deleted, or may be moved to
/// another backend during migration, without touching the reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<RecordId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub remind_at: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn from_request(id: RecordId, req: CreateReminderRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            note_id: req.note_id,
            title: req.title,
            description: req.description,
            remind_at: req.remind_at,
            priority: req.priority,
            is_completed: false,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }
}

/// Request for creating a new reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReminderRequest {
    #[serde(default)]
    pub note_id: Option<RecordId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
}

impl CreateReminderRequest {
    pub fn new(title: impl Into<String>, remind_at: DateTime<Utc>) -> Self {
        Self {
            note_id: None,
            title: title.into(),
            description: String::new(),
            remind_at,
            priority: Priority::default(),
        }
    }

    pub fn with_note(mut self, note_id: RecordId) -> Self {
        self.note_id = Some(note_id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// =============================================================================
// GUEST TYPES
// =============================================================================

/// The single anonymous identity held on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestProfile {
    pub id: Uuid,
    /// Denormalized; always re-derived from the notes list.
    pub note_count: usize,
    pub created_at: DateTime<Utc>,
}

impl GuestProfile {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            note_count: 0,
            created_at: now,
        }
    }
}

/// Point-in-time copy of everything in the guest store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestExport {
    pub notes: Vec<Note>,
    pub reminders: Vec<Reminder>,
}

impl GuestExport {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.reminders.is_empty()
    }
}

// =============================================================================
// SESSION TYPES
// =============================================================================

/// Which backend currently owns truth for the whole application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeState {
    #[default]
    Uninitialized,
    Guest,
    Authenticated,
    Migrating,
}

impl fmt::Display for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModeState::Uninitialized => "uninitialized",
            ModeState::Guest => "guest",
            ModeState::Authenticated => "authenticated",
            ModeState::Migrating => "migrating",
        };
        f.write_str(s)
    }
}

/// An authenticated account as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Identity event emitted by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "identity", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn(_) => "signed_in",
            AuthEvent::SignedOut => "signed_out",
        }
    }
}

// =============================================================================
// MIGRATION TYPES
// =============================================================================

/// Mapping from a guest note to the record the remote store created for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedNote {
    pub source_id: RecordId,
    pub remote_id: RecordId,
}

/// Mapping from a guest reminder to the record the remote store created for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedReminder {
    pub source_id: RecordId,
    pub remote_id: RecordId,
}

/// Outcome of one migration run, used for user-facing reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub notes_migrated: usize,
    pub notes_total: usize,
    pub reminders_migrated: usize,
    pub reminders_total: usize,
    /// Note batches the remote store rejected.
    pub failed_batches: usize,
    /// Whether local guest data was erased afterwards.
    pub guest_retired: bool,
}

impl MigrationReport {
    /// True when some records were attempted but not transferred.
    pub fn is_partial(&self) -> bool {
        self.notes_migrated < self.notes_total || self.reminders_migrated < self.reminders_total
    }

    /// Human readable summary, e.g. `"migrated 3 of 5 notes and 1 of 1 reminders"`.
    pub fn summary(&self) -> String {
        format!(
            "migrated {} of {} notes and {} of {} reminders",
            self.notes_migrated, self.notes_total, self.reminders_migrated, self.reminders_total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display_and_parse() {
        let id = RecordId::new_guest();
        let rendered = id.to_string();
        assert!(rendered.starts_with("guest:"));
        assert_eq!(rendered.parse::<RecordId>().unwrap(), id);

        let remote = RecordId::new_remote();
        assert_eq!(remote.to_string().parse::<RecordId>().unwrap(), remote);
    }

    #[test]
    fn test_record_id_bare_uuid_is_guest() {
        let raw = Uuid::now_v7();
        let parsed: RecordId = raw.to_string().parse().unwrap();
        assert_eq!(parsed, RecordId::guest(raw));
    }

    #[test]
    fn test_record_id_rejects_unknown_origin() {
        let err = format!("cloud:{}", Uuid::nil()).parse::<RecordId>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_same_uuid_different_origin_not_equal() {
        let raw = Uuid::now_v7();
        assert_ne!(RecordId::guest(raw), RecordId::remote(raw));
    }

    #[test]
    fn test_note_type_serializes_lowercase() {
        let json = serde_json::to_string(&NoteType::Image).unwrap();
        assert_eq!(json, "\"image\"");
        assert_eq!("URL".parse::<NoteType>().unwrap(), NoteType::Url);
    }

    #[test]
    fn test_note_serializes_type_field() {
        let note = Note::from_request(
            RecordId::new_guest(),
            CreateNoteRequest::text("t", "body").with_type(NoteType::Url),
            Utc::now(),
        );
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["type"], "url");
        assert_eq!(value["id"]["origin"], "guest");
        assert!(value.get("source_url").is_none());
    }

    #[test]
    fn test_note_apply_partial_update() {
        let created = Utc::now();
        let mut note = Note::from_request(
            RecordId::new_guest(),
            CreateNoteRequest::text("Title", "Body").with_tags(["a", "b"]),
            created,
        );
        let later = created + chrono::Duration::seconds(5);
        note.apply(
            UpdateNoteRequest {
                title: Some("New".into()),
                ..Default::default()
            },
            later,
        );
        assert_eq!(note.title, "New");
        assert_eq!(note.original_content, "Body");
        assert_eq!(note.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(note.created_at, created);
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateNoteRequest::default().is_empty());
        let req = UpdateNoteRequest {
            summary: Some("s".into()),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn test_priority_parse_and_order() {
        assert_eq!("High".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::Low < Priority::High);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_new_reminder_is_active() {
        let reminder = Reminder::from_request(
            RecordId::new_guest(),
            CreateReminderRequest::new("Call", Utc::now()),
            Utc::now(),
        );
        assert!(reminder.is_active());
        assert!(reminder.note_id.is_none());
    }

    #[test]
    fn test_auth_event_serialization() {
        let event = AuthEvent::SignedIn(Identity::new("u1"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "signed_in");
        assert_eq!(json["identity"]["id"], "u1");
        assert_eq!(AuthEvent::SignedOut.name(), "signed_out");
    }

    #[test]
    fn test_mode_state_default_is_uninitialized() {
        assert_eq!(ModeState::default(), ModeState::Uninitialized);
        assert_eq!(ModeState::Migrating.to_string(), "migrating");
    }

    #[test]
    fn test_migration_report_partial() {
        let full = MigrationReport {
            notes_migrated: 3,
            notes_total: 3,
            reminders_migrated: 1,
            reminders_total: 1,
            failed_batches: 0,
            guest_retired: true,
        };
        assert!(!full.is_partial());
        assert_eq!(full.summary(), "migrated 3 of 3 notes and 1 of 1 reminders");

        let partial = MigrationReport {
            notes_migrated: 10,
            notes_total: 25,
            failed_batches: 1,
            ..full
        };
        assert!(partial.is_partial());
    }

    #[test]
    fn test_guest_export_is_empty() {
        assert!(GuestExport::default().is_empty());
    }
}
