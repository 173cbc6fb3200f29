//! The local guest store.
//!
//! Holds the one guest profile plus its notes and reminders, mirrored in
//! memory and persisted through a [`StorageBackend`]. Every mutation is
//! written durably before it becomes visible in memory, so a failed write
//! never leaves memory ahead of disk.
//!
//! Usage counters are never stored on their own. They are recomputed from the
//! persisted lists on load, which keeps the quota honest after a crash between
//! writes.
//!
//! A retired guest never comes back. [`GuestStore::clear_all`] drops the
//! profile first and empties memory even when a delete fails; leftover records
//! without a profile are ignored on load, and a failed clear is retried before
//! the next load.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use driftnote_core::defaults::{GUEST_NOTES_KEY, GUEST_PROFILE_KEY, GUEST_REMINDERS_KEY};
use driftnote_core::{
    check_quota, CreateNoteRequest, CreateReminderRequest, Error, GuestExport, GuestProfile,
    Note, QuotaLimits, QuotaOperation, RecordId, Reminder, Result, UpdateNoteRequest,
    UsageCounters,
};

use crate::backend::StorageBackend;

#[derive(Debug, Default)]
struct GuestState {
    loaded: bool,
    profile: Option<GuestProfile>,
    /// Newest first.
    notes: Vec<Note>,
    /// Creation order; completed reminders are retained.
    reminders: Vec<Reminder>,
    /// A clear failed part way; storage may still hold retired records.
    retire_pending: bool,
}

impl GuestState {
    fn usage(&self, limits: QuotaLimits) -> UsageCounters {
        let active = self.reminders.iter().filter(|r| r.is_active()).count();
        UsageCounters::new(self.notes.len(), active, limits)
    }

    fn require_profile(&self) -> Result<&GuestProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| Error::NotFound("guest profile".to_string()))
    }
}

/// Durable CRUD for exactly one guest.
pub struct GuestStore {
    backend: Arc<dyn StorageBackend>,
    limits: QuotaLimits,
    state: Mutex<GuestState>,
}

impl GuestStore {
    /// Create a store over `backend`. Nothing is read until first use.
    pub fn new(backend: Arc<dyn StorageBackend>, limits: QuotaLimits) -> Self {
        Self {
            backend,
            limits,
            state: Mutex::new(GuestState::default()),
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Load the persisted profile, notes and reminders into memory.
    ///
    /// Does not create a profile. Safe to call repeatedly; each call reloads
    /// from durable storage.
    #[instrument(skip(self), fields(subsystem = "local", component = "guest_store", op = "initialize"))]
    pub async fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.load_into(&mut state).await
    }

    async fn load_into(&self, state: &mut GuestState) -> Result<()> {
        if state.retire_pending {
            if let Err(e) = self.delete_all().await {
                warn!(error = %e, "Retired guest data still on disk; keeping store empty");
                state.loaded = true;
                return Ok(());
            }
            info!("Finished clearing retired guest data");
            state.retire_pending = false;
        }

        let mut profile: Option<GuestProfile> = self.read_json(GUEST_PROFILE_KEY).await?;
        let mut notes: Vec<Note> = self.read_json(GUEST_NOTES_KEY).await?.unwrap_or_default();
        let mut reminders: Vec<Reminder> = self
            .read_json(GUEST_REMINDERS_KEY)
            .await?
            .unwrap_or_default();

        if profile.is_none() && !(notes.is_empty() && reminders.is_empty()) {
            warn!(
                notes = notes.len(),
                reminders = reminders.len(),
                "Ignoring records left behind by a retired guest"
            );
            notes.clear();
            reminders.clear();
        }

        if let Some(p) = profile.as_mut() {
            if p.note_count != notes.len() {
                warn!(
                    profile_id = %p.id,
                    stored = p.note_count,
                    actual = notes.len(),
                    "Guest note counter disagreed with persisted notes; recomputed"
                );
            }
            p.note_count = notes.len();
        }

        debug!(
            has_profile = profile.is_some(),
            notes = notes.len(),
            reminders = reminders.len(),
            "Guest store loaded"
        );

        *state = GuestState {
            loaded: true,
            profile,
            notes,
            reminders,
            retire_pending: false,
        };
        Ok(())
    }

    async fn ensure_loaded(&self, state: &mut GuestState) -> Result<()> {
        if !state.loaded {
            self.load_into(state).await?;
        }
        Ok(())
    }

    /// Create the guest profile. Fails with `AlreadyExists` if one is persisted.
    pub async fn create_profile(&self) -> Result<GuestProfile> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        if let Some(existing) = &state.profile {
            return Err(Error::AlreadyExists(format!("guest profile {}", existing.id)));
        }
        self.create_profile_locked(&mut state).await
    }

    /// Return the existing profile, creating one if absent.
    pub async fn ensure_profile(&self) -> Result<GuestProfile> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        match &state.profile {
            Some(profile) => Ok(profile.clone()),
            None => self.create_profile_locked(&mut state).await,
        }
    }

    async fn create_profile_locked(&self, state: &mut GuestState) -> Result<GuestProfile> {
        if state.retire_pending {
            // A new guest must not adopt the previous guest's records.
            self.delete_all().await?;
            state.retire_pending = false;
        }
        let mut profile = GuestProfile::new(Utc::now());
        profile.note_count = state.notes.len();
        self.write_json(GUEST_PROFILE_KEY, &profile).await?;
        info!(profile_id = %profile.id, "Guest profile created");
        state.profile = Some(profile.clone());
        Ok(profile)
    }

    /// Current profile, if any.
    pub async fn profile(&self) -> Result<Option<GuestProfile>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.profile.clone())
    }

    /// Live usage derived from the stored records.
    pub async fn usage(&self) -> Result<UsageCounters> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.usage(self.limits))
    }

    /// True when any note or reminder is stored.
    pub async fn has_data(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(!state.notes.is_empty() || !state.reminders.is_empty())
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    /// Create a note, newest first. Quota-checked before any mutation.
    #[instrument(skip(self, req), fields(subsystem = "local", component = "guest_store", op = "create_note"))]
    pub async fn create_note(&self, req: CreateNoteRequest) -> Result<Note> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        state.require_profile()?;

        let usage = state.usage(self.limits);
        let decision = check_quota(&usage, QuotaOperation::CreateNote);
        debug!(notes = usage.notes, max_notes = usage.max_notes, allowed = decision.is_allowed(), "Quota check");
        decision.into_result()?;

        let note = Note::from_request(RecordId::new_guest(), req, Utc::now());
        let mut notes = state.notes.clone();
        notes.insert(0, note.clone());
        self.commit_notes(&mut state, notes).await?;

        debug!(note_id = %note.id, "Guest note created");
        Ok(note)
    }

    /// Apply a partial update to a note.
    pub async fn update_note(&self, id: RecordId, req: UpdateNoteRequest) -> Result<Note> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let mut notes = state.notes.clone();
        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::NoteNotFound(id))?;
        note.apply(req, Utc::now());
        let updated = note.clone();

        self.write_json(GUEST_NOTES_KEY, &notes).await?;
        state.notes = notes;
        Ok(updated)
    }

    /// Delete a note and re-derive the profile counter.
    pub async fn delete_note(&self, id: RecordId) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        if !state.notes.iter().any(|n| n.id == id) {
            return Err(Error::NoteNotFound(id));
        }
        let notes: Vec<Note> = state.notes.iter().filter(|n| n.id != id).cloned().collect();
        self.commit_notes(&mut state, notes).await?;

        debug!(note_id = %id, "Guest note deleted");
        Ok(())
    }

    pub async fn get_note(&self, id: RecordId) -> Result<Note> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        state
            .notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    /// All notes, newest first.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.notes.clone())
    }

    /// Persist a new notes list, then the profile counter.
    ///
    /// The notes list is the source of truth; a failed counter write is only
    /// logged because the next load recomputes it.
    async fn commit_notes(&self, state: &mut GuestState, notes: Vec<Note>) -> Result<()> {
        self.write_json(GUEST_NOTES_KEY, &notes).await?;
        let count = notes.len();
        state.notes = notes;

        if let Some(profile) = state.profile.as_mut() {
            profile.note_count = count;
            if let Err(e) = self.write_json(GUEST_PROFILE_KEY, &*profile).await {
                warn!(profile_id = %profile.id, error = %e, "Failed to persist guest note counter");
            }
        }
        Ok(())
    }

    // =========================================================================
    // REMINDERS
    // =========================================================================

    /// Create a reminder. Quota-checked against active reminders.
    #[instrument(skip(self, req), fields(subsystem = "local", component = "guest_store", op = "create_reminder"))]
    pub async fn create_reminder(&self, req: CreateReminderRequest) -> Result<Reminder> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        state.require_profile()?;

        let usage = state.usage(self.limits);
        let decision = check_quota(&usage, QuotaOperation::CreateReminder);
        debug!(reminders = usage.reminders, max_reminders = usage.max_reminders, allowed = decision.is_allowed(), "Quota check");
        decision.into_result()?;

        let reminder = Reminder::from_request(RecordId::new_guest(), req, Utc::now());
        let mut reminders = state.reminders.clone();
        reminders.push(reminder.clone());
        self.write_json(GUEST_REMINDERS_KEY, &reminders).await?;
        state.reminders = reminders;

        debug!(reminder_id = %reminder.id, "Guest reminder created");
        Ok(reminder)
    }

    /// Mark a reminder completed. The record is kept for history.
    pub async fn complete_reminder(&self, id: RecordId) -> Result<Reminder> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let mut reminders = state.reminders.clone();
        let reminder = reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(Error::ReminderNotFound(id))?;
        if reminder.is_completed {
            return Ok(reminder.clone());
        }
        reminder.is_completed = true;
        let completed = reminder.clone();

        self.write_json(GUEST_REMINDERS_KEY, &reminders).await?;
        state.reminders = reminders;
        Ok(completed)
    }

    pub async fn delete_reminder(&self, id: RecordId) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        if !state.reminders.iter().any(|r| r.id == id) {
            return Err(Error::ReminderNotFound(id));
        }
        let reminders: Vec<Reminder> = state
            .reminders
            .iter()
            .filter(|r| r.id != id)
            .cloned()
            .collect();
        self.write_json(GUEST_REMINDERS_KEY, &reminders).await?;
        state.reminders = reminders;
        Ok(())
    }

    /// Reminders not yet completed, soonest first.
    pub async fn list_active_reminders(&self) -> Result<Vec<Reminder>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        let mut active: Vec<Reminder> = state
            .reminders
            .iter()
            .filter(|r| r.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|r| r.remind_at);
        Ok(active)
    }

    /// Every reminder, including completed ones.
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.reminders.clone())
    }

    // =========================================================================
    // MIGRATION SUPPORT
    // =========================================================================

    /// Snapshot copy of all guest data.
    pub async fn export_all(&self) -> Result<GuestExport> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(GuestExport {
            notes: state.notes.clone(),
            reminders: state.reminders.clone(),
        })
    }

    /// Irreversibly erase the profile, notes and reminders.
    ///
    /// The in-memory guest is discarded whether or not storage cooperates. On
    /// a delete failure the error is returned and the remaining deletes are
    /// retried on the next load.
    #[instrument(skip(self), fields(subsystem = "local", component = "guest_store", op = "clear_all"))]
    pub async fn clear_all(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let result = self.delete_all().await;

        let profile_id = state.profile.as_ref().map(|p| p.id);
        *state = GuestState {
            loaded: true,
            retire_pending: result.is_err(),
            ..Default::default()
        };
        match &result {
            Ok(()) => info!(profile_id = ?profile_id, "Guest data cleared"),
            Err(e) => warn!(profile_id = ?profile_id, error = %e, "Guest retired in memory; storage clear pending"),
        }
        result
    }

    /// Profile first: records without a profile are never loaded again.
    async fn delete_all(&self) -> Result<()> {
        self.backend.delete(GUEST_PROFILE_KEY).await?;
        self.backend.delete(GUEST_NOTES_KEY).await?;
        self.backend.delete(GUEST_REMINDERS_KEY).await
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.read(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.backend.write(key, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use chrono::Duration;

    async fn store_with_profile() -> (GuestStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = GuestStore::new(Arc::new(backend.clone()), QuotaLimits::default());
        store.initialize().await.unwrap();
        store.create_profile().await.unwrap();
        (store, backend)
    }

    #[tokio::test]
    async fn test_initialize_does_not_create_profile() {
        let store = GuestStore::new(Arc::new(MemoryBackend::new()), QuotaLimits::default());
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
        assert!(store.profile().await.unwrap().is_none());
        assert!(!store.has_data().await.unwrap());
    }

    #[tokio::test]
    async fn test_create_profile_twice_fails() {
        let (store, _) = store_with_profile().await;
        let err = store.create_profile().await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_ensure_profile_is_stable() {
        let store = GuestStore::new(Arc::new(MemoryBackend::new()), QuotaLimits::default());
        let first = store.ensure_profile().await.unwrap();
        let second = store.ensure_profile().await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_create_note_requires_profile() {
        let store = GuestStore::new(Arc::new(MemoryBackend::new()), QuotaLimits::default());
        let err = store
            .create_note(CreateNoteRequest::text("a", "b"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_notes_listed_newest_first() {
        let (store, _) = store_with_profile().await;
        let first = store.create_note(CreateNoteRequest::text("one", "1")).await.unwrap();
        let second = store.create_note(CreateNoteRequest::text("two", "2")).await.unwrap();

        let notes = store.list_notes().await.unwrap();
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert!(first.id.is_guest());
        assert_eq!(store.profile().await.unwrap().unwrap().note_count, 2);
    }

    #[tokio::test]
    async fn test_note_quota_rejects_without_mutation() {
        let (store, backend) = store_with_profile().await;
        for i in 0..3 {
            store
                .create_note(CreateNoteRequest::text(format!("n{i}"), "x"))
                .await
                .unwrap();
        }
        let before = backend.raw(GUEST_NOTES_KEY);

        let err = store
            .create_note(CreateNoteRequest::text("n4", "x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::QuotaExceeded {
                kind: QuotaOperation::CreateNote,
                limit: 3
            }
        ));
        assert_eq!(store.usage().await.unwrap().notes, 3);
        assert_eq!(backend.raw(GUEST_NOTES_KEY), before);
    }

    #[tokio::test]
    async fn test_delete_frees_quota() {
        let (store, _) = store_with_profile().await;
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(
                store
                    .create_note(CreateNoteRequest::text(format!("n{i}"), "x"))
                    .await
                    .unwrap()
                    .id,
            );
        }
        store.delete_note(ids[0]).await.unwrap();
        assert_eq!(store.profile().await.unwrap().unwrap().note_count, 2);
        store.create_note(CreateNoteRequest::text("again", "x")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_note() {
        let (store, _) = store_with_profile().await;
        let missing = RecordId::new_guest();
        assert!(matches!(
            store.update_note(missing, UpdateNoteRequest::default()).await,
            Err(Error::NoteNotFound(id)) if id == missing
        ));
        assert!(matches!(
            store.delete_note(missing).await,
            Err(Error::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_note_persists() {
        let (store, backend) = store_with_profile().await;
        let note = store.create_note(CreateNoteRequest::text("old", "x")).await.unwrap();
        let updated = store
            .update_note(
                note.id,
                UpdateNoteRequest {
                    title: Some("new".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "new");

        let reopened = GuestStore::new(Arc::new(backend), QuotaLimits::default());
        assert_eq!(reopened.get_note(note.id).await.unwrap().title, "new");
    }

    #[tokio::test]
    async fn test_reminder_quota_counts_active_only() {
        let (store, _) = store_with_profile().await;
        let now = Utc::now();
        let r1 = store
            .create_reminder(CreateReminderRequest::new("a", now))
            .await
            .unwrap();
        store
            .create_reminder(CreateReminderRequest::new("b", now))
            .await
            .unwrap();
        let err = store
            .create_reminder(CreateReminderRequest::new("c", now))
            .await
            .unwrap_err();
        assert!(err.is_quota_exceeded());

        store.complete_reminder(r1.id).await.unwrap();
        store
            .create_reminder(CreateReminderRequest::new("c", now))
            .await
            .unwrap();
        assert_eq!(store.usage().await.unwrap().reminders, 2);
        assert_eq!(store.list_reminders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_completed_reminder_leaves_active_view() {
        let (store, _) = store_with_profile().await;
        let now = Utc::now();
        let later = store
            .create_reminder(CreateReminderRequest::new("later", now + Duration::hours(2)))
            .await
            .unwrap();
        let sooner = store
            .create_reminder(CreateReminderRequest::new("sooner", now + Duration::hours(1)))
            .await
            .unwrap();

        let active = store.list_active_reminders().await.unwrap();
        assert_eq!(active.iter().map(|r| r.id).collect::<Vec<_>>(), vec![sooner.id, later.id]);

        let completed = store.complete_reminder(sooner.id).await.unwrap();
        assert!(completed.is_completed);
        // Completing twice is harmless.
        assert!(store.complete_reminder(sooner.id).await.unwrap().is_completed);

        let active = store.list_active_reminders().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, later.id);
    }

    #[tokio::test]
    async fn test_delete_missing_reminder() {
        let (store, _) = store_with_profile().await;
        assert!(matches!(
            store.delete_reminder(RecordId::new_guest()).await,
            Err(Error::ReminderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_export_is_a_snapshot() {
        let (store, _) = store_with_profile().await;
        store.create_note(CreateNoteRequest::text("a", "x")).await.unwrap();
        let snapshot = store.export_all().await.unwrap();
        store.create_note(CreateNoteRequest::text("b", "x")).await.unwrap();
        assert_eq!(snapshot.notes.len(), 1);
        assert_eq!(store.export_all().await.unwrap().notes.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let (store, backend) = store_with_profile().await;
        backend.set_fail_writes(true);
        let err = store
            .create_note(CreateNoteRequest::text("a", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(store.list_notes().await.unwrap().is_empty());
        assert_eq!(store.usage().await.unwrap().notes, 0);
    }

    #[tokio::test]
    async fn test_stale_counter_is_recomputed_on_load() {
        let backend = MemoryBackend::new();
        let store = GuestStore::new(Arc::new(backend.clone()), QuotaLimits::default());
        store.ensure_profile().await.unwrap();
        store.create_note(CreateNoteRequest::text("a", "x")).await.unwrap();
        store.create_note(CreateNoteRequest::text("b", "x")).await.unwrap();

        // Simulate a crash after the notes write but before the counter write.
        let mut profile: GuestProfile =
            serde_json::from_slice(&backend.raw(GUEST_PROFILE_KEY).unwrap()).unwrap();
        profile.note_count = 0;
        backend
            .write(GUEST_PROFILE_KEY, &serde_json::to_vec(&profile).unwrap())
            .await
            .unwrap();

        let reopened = GuestStore::new(Arc::new(backend), QuotaLimits::default());
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.profile().await.unwrap().unwrap().note_count, 2);
        reopened.create_note(CreateNoteRequest::text("c", "x")).await.unwrap();
        assert!(reopened
            .create_note(CreateNoteRequest::text("d", "x"))
            .await
            .unwrap_err()
            .is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_failed_clear_still_retires_guest() {
        let (store, backend) = store_with_profile().await;
        store.create_note(CreateNoteRequest::text("a", "x")).await.unwrap();
        backend.set_fail_writes(true);

        assert!(matches!(store.clear_all().await, Err(Error::Io(_))));
        assert!(store.profile().await.unwrap().is_none());
        assert!(!store.has_data().await.unwrap());

        // Storage still refuses: a reload must not resurrect the old guest.
        store.initialize().await.unwrap();
        assert!(store.export_all().await.unwrap().is_empty());
        assert!(backend.raw(GUEST_NOTES_KEY).is_some());

        backend.set_fail_writes(false);
        store.initialize().await.unwrap();
        assert!(backend.is_empty());
        assert!(store.profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_without_profile_are_ignored() {
        let (store, backend) = store_with_profile().await;
        store.create_note(CreateNoteRequest::text("a", "x")).await.unwrap();
        backend.delete(GUEST_PROFILE_KEY).await.unwrap();

        let reopened = GuestStore::new(Arc::new(backend), QuotaLimits::default());
        reopened.initialize().await.unwrap();
        assert!(!reopened.has_data().await.unwrap());
        assert!(reopened.list_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_is_safe_when_empty() {
        let store = GuestStore::new(Arc::new(MemoryBackend::new()), QuotaLimits::default());
        store.clear_all().await.unwrap();
        store.clear_all().await.unwrap();
        assert!(store.profile().await.unwrap().is_none());
    }
}
