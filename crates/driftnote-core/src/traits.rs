//! Collaborator traits consumed by the session layer.
//!
//! The remote store, the authentication provider, and the text analyzer are
//! external systems. These traits are the narrow seams through which driftnote
//! talks to them, and the places tests plug deterministic doubles into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REMOTE STORE
// =============================================================================

/// The authenticated system of record.
///
/// Every call is scoped to the identity id of the signed-in account. Ids
/// passed in are always remote-origin; the session layer filters out guest ids
/// before they get here.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert guest notes under `identity_id`, returning the id mapping for
    /// each note that was stored.
    async fn bulk_insert_notes(&self, identity_id: &str, notes: Vec<Note>)
        -> Result<Vec<InsertedNote>>;

    /// Insert guest reminders under `identity_id`.
    async fn bulk_insert_reminders(
        &self,
        identity_id: &str,
        reminders: Vec<Reminder>,
    ) -> Result<Vec<InsertedReminder>>;

    /// Create a single note.
    async fn create_note(&self, identity_id: &str, req: CreateNoteRequest) -> Result<Note>;

    /// Apply a partial update to a note.
    async fn update_note(
        &self,
        identity_id: &str,
        id: RecordId,
        req: UpdateNoteRequest,
    ) -> Result<Note>;

    /// Delete a note.
    async fn delete_note(&self, identity_id: &str, id: RecordId) -> Result<()>;

    /// Fetch one note.
    async fn get_note(&self, identity_id: &str, id: RecordId) -> Result<Note>;

    /// List notes, newest first.
    async fn list_notes(&self, identity_id: &str) -> Result<Vec<Note>>;

    /// Create a single reminder.
    async fn create_reminder(
        &self,
        identity_id: &str,
        req: CreateReminderRequest,
    ) -> Result<Reminder>;

    /// Mark a reminder completed.
    async fn complete_reminder(&self, identity_id: &str, id: RecordId) -> Result<Reminder>;

    /// Delete a reminder.
    async fn delete_reminder(&self, identity_id: &str, id: RecordId) -> Result<()>;

    /// List reminders that are not completed.
    async fn list_active_reminders(&self, identity_id: &str) -> Result<Vec<Reminder>>;
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// On-demand view of the auth provider's current session.
///
/// The event half of the provider (sign-in / sign-out notifications) is
/// delivered as a stream of [`AuthEvent`] wired up by the host application.
#[async_trait]
pub trait AuthObserver: Send + Sync {
    /// Who is signed in right now, if anyone.
    async fn current_identity(&self) -> Result<Option<Identity>>;
}

// =============================================================================
// CONTENT ANALYSIS
// =============================================================================

/// Title, summary and tags derived from raw captured content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
}

/// Text-analysis collaborator used by note capture flows.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, content: &str, note_type: NoteType) -> Result<Analysis>;
}
