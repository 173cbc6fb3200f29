//! Deterministic collaborators for testing the session layer.
//!
//! Provides in-memory stand-ins for the remote store, the auth provider and
//! the content analyzer. Every double is `Clone` and clones share state, so a
//! test keeps one handle for assertions and hands another to the controller.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use driftnote_session::mock::{MockAuthObserver, MockRemoteStore};
//! use driftnote_session::Identity;
//!
//! let remote = MockRemoteStore::new().fail_note_batch(1);
//! let auth = MockAuthObserver::signed_in(Identity::new("user-1"));
//!
//! let remote_handle: Arc<dyn driftnote_session::RemoteStore> = Arc::new(remote.clone());
//! assert!(remote.calls().is_empty());
//! # let _ = (remote_handle, auth);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use driftnote_core::{
    Analysis, AuthObserver, ContentAnalyzer, CreateNoteRequest, CreateReminderRequest, Error,
    Identity, InsertedNote, InsertedReminder, Note, NoteType, RecordId, Reminder, RemoteStore,
    Result, UpdateNoteRequest,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// =============================================================================
// REMOTE STORE
// =============================================================================

/// One recorded call against [`MockRemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub operation: &'static str,
    pub identity_id: String,
    /// Records carried by the call (1 for single-record operations).
    pub records: usize,
}

#[derive(Debug, Default)]
struct RemoteState {
    notes: HashMap<String, Vec<Note>>,
    reminders: HashMap<String, Vec<Reminder>>,
    calls: Vec<RemoteCall>,
    note_batches_seen: usize,
    failing_note_batches: HashSet<usize>,
    fail_reminder_inserts: bool,
    latency: Duration,
}

/// In-memory remote store keyed by identity id.
///
/// Bulk inserts assign fresh remote ids and report the guest-to-remote
/// mapping, like the real store does.
#[derive(Clone, Default)]
pub struct MockRemoteStore {
    state: Arc<Mutex<RemoteState>>,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `index`-th (0-based) `bulk_insert_notes` call.
    pub fn fail_note_batch(self, index: usize) -> Self {
        lock(&self.state).failing_note_batches.insert(index);
        self
    }

    /// Fail every `bulk_insert_reminders` call.
    pub fn fail_reminder_inserts(self) -> Self {
        lock(&self.state).fail_reminder_inserts = true;
        self
    }

    /// Delay every bulk insert by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        lock(&self.state).latency = latency;
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.state).calls.clone()
    }

    /// Sizes of every `bulk_insert_notes` call, failed ones included.
    pub fn note_batch_sizes(&self) -> Vec<usize> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.operation == "bulk_insert_notes")
            .map(|c| c.records)
            .collect()
    }

    /// Notes stored under `identity_id`, newest first.
    pub fn notes_for(&self, identity_id: &str) -> Vec<Note> {
        lock(&self.state)
            .notes
            .get(identity_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Reminders stored under `identity_id`, in insertion order.
    pub fn reminders_for(&self, identity_id: &str) -> Vec<Reminder> {
        lock(&self.state)
            .reminders
            .get(identity_id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, operation: &'static str, identity_id: &str, records: usize) {
        lock(&self.state).calls.push(RemoteCall {
            operation,
            identity_id: identity_id.to_string(),
            records,
        });
    }

    async fn simulate_latency(&self) {
        let latency = lock(&self.state).latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn bulk_insert_notes(
        &self,
        identity_id: &str,
        notes: Vec<Note>,
    ) -> Result<Vec<InsertedNote>> {
        self.record("bulk_insert_notes", identity_id, notes.len());
        self.simulate_latency().await;

        let mut state = lock(&self.state);
        let batch_index = state.note_batches_seen;
        state.note_batches_seen += 1;
        if state.failing_note_batches.contains(&batch_index) {
            return Err(Error::Remote(format!("note batch {batch_index} rejected")));
        }

        let stored = state.notes.entry(identity_id.to_string()).or_default();
        let mut inserted = Vec::with_capacity(notes.len());
        for mut note in notes {
            let remote_id = RecordId::new_remote();
            inserted.push(InsertedNote {
                source_id: note.id,
                remote_id,
            });
            note.id = remote_id;
            stored.push(note);
        }
        stored.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(inserted)
    }

    async fn bulk_insert_reminders(
        &self,
        identity_id: &str,
        reminders: Vec<Reminder>,
    ) -> Result<Vec<InsertedReminder>> {
        self.record("bulk_insert_reminders", identity_id, reminders.len());
        self.simulate_latency().await;

        let mut state = lock(&self.state);
        if state.fail_reminder_inserts {
            return Err(Error::Remote("reminder insert rejected".to_string()));
        }

        let stored = state.reminders.entry(identity_id.to_string()).or_default();
        let mut inserted = Vec::with_capacity(reminders.len());
        for mut reminder in reminders {
            let remote_id = RecordId::new_remote();
            inserted.push(InsertedReminder {
                source_id: reminder.id,
                remote_id,
            });
            reminder.id = remote_id;
            stored.push(reminder);
        }
        Ok(inserted)
    }

    async fn create_note(&self, identity_id: &str, req: CreateNoteRequest) -> Result<Note> {
        self.record("create_note", identity_id, 1);
        let note = Note::from_request(RecordId::new_remote(), req, Utc::now());
        lock(&self.state)
            .notes
            .entry(identity_id.to_string())
            .or_default()
            .insert(0, note.clone());
        Ok(note)
    }

    async fn update_note(
        &self,
        identity_id: &str,
        id: RecordId,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        self.record("update_note", identity_id, 1);
        let mut state = lock(&self.state);
        let note = state
            .notes
            .get_mut(identity_id)
            .and_then(|notes| notes.iter_mut().find(|n| n.id == id))
            .ok_or(Error::NoteNotFound(id))?;
        note.apply(req, Utc::now());
        Ok(note.clone())
    }

    async fn delete_note(&self, identity_id: &str, id: RecordId) -> Result<()> {
        self.record("delete_note", identity_id, 1);
        let mut state = lock(&self.state);
        let notes = state.notes.entry(identity_id.to_string()).or_default();
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn get_note(&self, identity_id: &str, id: RecordId) -> Result<Note> {
        self.record("get_note", identity_id, 1);
        self.notes_for(identity_id)
            .into_iter()
            .find(|n| n.id == id)
            .ok_or(Error::NoteNotFound(id))
    }

    async fn list_notes(&self, identity_id: &str) -> Result<Vec<Note>> {
        self.record("list_notes", identity_id, 0);
        Ok(self.notes_for(identity_id))
    }

    async fn create_reminder(
        &self,
        identity_id: &str,
        req: CreateReminderRequest,
    ) -> Result<Reminder> {
        self.record("create_reminder", identity_id, 1);
        let reminder = Reminder::from_request(RecordId::new_remote(), req, Utc::now());
        lock(&self.state)
            .reminders
            .entry(identity_id.to_string())
            .or_default()
            .push(reminder.clone());
        Ok(reminder)
    }

    async fn complete_reminder(&self, identity_id: &str, id: RecordId) -> Result<Reminder> {
        self.record("complete_reminder", identity_id, 1);
        let mut state = lock(&self.state);
        let reminder = state
            .reminders
            .get_mut(identity_id)
            .and_then(|rs| rs.iter_mut().find(|r| r.id == id))
            .ok_or(Error::ReminderNotFound(id))?;
        reminder.is_completed = true;
        Ok(reminder.clone())
    }

    async fn delete_reminder(&self, identity_id: &str, id: RecordId) -> Result<()> {
        self.record("delete_reminder", identity_id, 1);
        let mut state = lock(&self.state);
        let reminders = state.reminders.entry(identity_id.to_string()).or_default();
        let before = reminders.len();
        reminders.retain(|r| r.id != id);
        if reminders.len() == before {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }

    async fn list_active_reminders(&self, identity_id: &str) -> Result<Vec<Reminder>> {
        self.record("list_active_reminders", identity_id, 0);
        let mut active: Vec<Reminder> = self
            .reminders_for(identity_id)
            .into_iter()
            .filter(|r| r.is_active())
            .collect();
        active.sort_by_key(|r| r.remind_at);
        Ok(active)
    }
}

// =============================================================================
// AUTH OBSERVER
// =============================================================================

#[derive(Debug, Default)]
struct AuthState {
    current: Option<Identity>,
    /// Answers served before falling back to `current`.
    script: VecDeque<std::result::Result<Option<Identity>, String>>,
    calls: usize,
}

/// Auth observer with a scriptable answer queue.
///
/// Each `current_identity` call pops the next scripted answer; once the
/// script is exhausted it reports the steady-state identity.
#[derive(Clone, Default)]
pub struct MockAuthObserver {
    state: Arc<Mutex<AuthState>>,
}

impl MockAuthObserver {
    /// Nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// `identity` is signed in from the first call.
    pub fn signed_in(identity: Identity) -> Self {
        let auth = Self::new();
        auth.set_current(Some(identity));
        auth
    }

    pub fn set_current(&self, identity: Option<Identity>) {
        lock(&self.state).current = identity;
    }

    /// Queue a one-off answer.
    pub fn push_answer(&self, identity: Option<Identity>) {
        lock(&self.state).script.push_back(Ok(identity));
    }

    /// Queue a one-off failure.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.state).script.push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state).calls
    }
}

#[async_trait]
impl AuthObserver for MockAuthObserver {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        let mut state = lock(&self.state);
        state.calls += 1;
        match state.script.pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(Error::Auth(message)),
            None => Ok(state.current.clone()),
        }
    }
}

// =============================================================================
// CONTENT ANALYZER
// =============================================================================

/// Analyzer that returns a fixed analysis, or fails on demand.
#[derive(Clone, Default)]
pub struct MockContentAnalyzer {
    analysis: Analysis,
    fail: bool,
    calls: Arc<Mutex<Vec<NoteType>>>,
}

impl MockContentAnalyzer {
    pub fn new(analysis: Analysis) -> Self {
        Self {
            analysis,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Note types passed to `analyze`, in call order.
    pub fn calls(&self) -> Vec<NoteType> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ContentAnalyzer for MockContentAnalyzer {
    async fn analyze(&self, _content: &str, note_type: NoteType) -> Result<Analysis> {
        lock(&self.calls).push(note_type);
        if self.fail {
            return Err(Error::Remote("analysis unavailable".to_string()));
        }
        Ok(self.analysis.clone())
    }
}
