//! Guest-to-account migration.
//!
//! One run moves every guest record into the remote store under a freshly
//! authenticated identity:
//!
//! 1. Snapshot the guest store. An empty snapshot skips straight to retirement.
//! 2. Wait a fixed settle interval for the auth provider to propagate the session.
//! 3. Confirm the provider reports the target identity, with bounded retries.
//!    Failure aborts with `SessionNotEstablished` and leaves guest data intact.
//! 4. Insert notes in fixed-size batches. A failed batch is logged and skipped.
//! 5. Insert all reminders in one call. A failure is logged.
//! 6. Clear the guest store, however many records made it across.
//!
//! Step 6 runs even after partial failure, so a retry can never insert the
//! same note twice. The un-migrated remainder is lost; callers surface the
//! counts from the returned [`MigrationReport`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use driftnote_core::{
    defaults, AuthObserver, Error, Identity, MigrationReport, Note, RecordId, Reminder,
    RemoteStore, Result,
};
use driftnote_local::GuestStore;

/// Timing and batching for migration runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Wait before the first identity check.
    pub settle: Duration,
    /// Identity checks before giving up (at least 1).
    pub verify_attempts: u32,
    /// Pause between identity checks.
    pub verify_backoff: Duration,
    /// Notes per bulk insert (at least 1).
    pub note_batch_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            settle: defaults::session_settle(),
            verify_attempts: defaults::SESSION_VERIFY_ATTEMPTS,
            verify_backoff: defaults::session_verify_backoff(),
            note_batch_size: defaults::MIGRATION_NOTE_BATCH_SIZE,
        }
    }
}

impl MigrationConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DRIFTNOTE_SESSION_SETTLE_MS` | `2000` | Wait before verifying the session |
    /// | `DRIFTNOTE_SESSION_VERIFY_ATTEMPTS` | `3` | Identity checks before aborting |
    /// | `DRIFTNOTE_SESSION_VERIFY_BACKOFF_MS` | `1000` | Pause between identity checks |
    /// | `DRIFTNOTE_MIGRATION_BATCH_SIZE` | `10` | Notes per bulk insert |
    pub fn from_env() -> Self {
        let settle_ms = std::env::var("DRIFTNOTE_SESSION_SETTLE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SESSION_SETTLE_MS);

        let verify_attempts = std::env::var("DRIFTNOTE_SESSION_VERIFY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults::SESSION_VERIFY_ATTEMPTS)
            .max(1);

        let backoff_ms = std::env::var("DRIFTNOTE_SESSION_VERIFY_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SESSION_VERIFY_BACKOFF_MS);

        let note_batch_size = std::env::var("DRIFTNOTE_MIGRATION_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MIGRATION_NOTE_BATCH_SIZE)
            .max(1);

        Self {
            settle: Duration::from_millis(settle_ms),
            verify_attempts,
            verify_backoff: Duration::from_millis(backoff_ms),
            note_batch_size,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_verify_attempts(mut self, attempts: u32) -> Self {
        self.verify_attempts = attempts.max(1);
        self
    }

    pub fn with_verify_backoff(mut self, backoff: Duration) -> Self {
        self.verify_backoff = backoff;
        self
    }

    pub fn with_note_batch_size(mut self, size: usize) -> Self {
        self.note_batch_size = size.max(1);
        self
    }
}

/// Moves guest records into the remote store.
///
/// Stateless between runs. The mode controller guarantees at most one run per
/// sign-in transition.
pub struct MigrationEngine {
    auth: Arc<dyn AuthObserver>,
    remote: Arc<dyn RemoteStore>,
    config: MigrationConfig,
}

impl MigrationEngine {
    pub fn new(
        auth: Arc<dyn AuthObserver>,
        remote: Arc<dyn RemoteStore>,
        config: MigrationConfig,
    ) -> Self {
        Self {
            auth,
            remote,
            config,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Migrate everything in `store` to `target`, then retire the guest.
    ///
    /// Only fails when the snapshot cannot be read or the session cannot be
    /// verified; in both cases guest data is left untouched.
    #[instrument(skip(self, store, target), fields(subsystem = "session", component = "migration", identity_id = %target.id))]
    pub async fn migrate(&self, store: &GuestStore, target: &Identity) -> Result<MigrationReport> {
        let start = Instant::now();
        let export = store.export_all().await?;

        let mut report = MigrationReport {
            notes_total: export.notes.len(),
            reminders_total: export.reminders.len(),
            ..Default::default()
        };

        if export.is_empty() {
            info!("No guest records to migrate; retiring guest profile");
        } else {
            info!(
                notes = report.notes_total,
                reminders = report.reminders_total,
                "Starting guest migration"
            );
            sleep(self.config.settle).await;
            self.verify_session(target).await?;

            let note_ids = self.transfer_notes(target, export.notes, &mut report).await;
            self.transfer_reminders(target, export.reminders, &note_ids, &mut report)
                .await;
        }

        report.guest_retired = match store.clear_all().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to clear guest data after migration");
                false
            }
        };

        info!(
            notes_migrated = report.notes_migrated,
            notes_total = report.notes_total,
            reminders_migrated = report.reminders_migrated,
            reminders_total = report.reminders_total,
            failed_batches = report.failed_batches,
            guest_retired = report.guest_retired,
            duration_ms = start.elapsed().as_millis() as u64,
            "Guest migration finished"
        );
        Ok(report)
    }

    /// Poll the auth observer until it reports `target`.
    async fn verify_session(&self, target: &Identity) -> Result<()> {
        let attempts = self.config.verify_attempts.max(1);
        let mut observed = None;

        for attempt in 1..=attempts {
            match self.auth.current_identity().await {
                Ok(Some(current)) if current.id == target.id => {
                    debug!(attempt, "Session verified");
                    return Ok(());
                }
                Ok(Some(current)) => {
                    debug!(attempt, observed = %current.id, "Session reports a different identity");
                    observed = Some(current.id);
                }
                Ok(None) => debug!(attempt, "Session reports no identity yet"),
                Err(e) => warn!(attempt, error = %e, "Identity query failed"),
            }
            if attempt < attempts {
                sleep(self.config.verify_backoff).await;
            }
        }

        warn!(attempts, "Session never reported the target identity; keeping guest data");
        Err(Error::SessionNotEstablished {
            expected: target.id.clone(),
            observed,
        })
    }

    /// Insert notes batch by batch. Returns guest id -> remote id for every
    /// note the remote store accepted.
    async fn transfer_notes(
        &self,
        target: &Identity,
        notes: Vec<Note>,
        report: &mut MigrationReport,
    ) -> HashMap<RecordId, RecordId> {
        let mut id_map = HashMap::with_capacity(notes.len());

        for (batch_index, batch) in notes.chunks(self.config.note_batch_size).enumerate() {
            let batch_size = batch.len();
            match self
                .remote
                .bulk_insert_notes(&target.id, batch.to_vec())
                .await
            {
                Ok(inserted) => {
                    report.notes_migrated += inserted.len().min(batch_size);
                    for mapping in inserted {
                        id_map.insert(mapping.source_id, mapping.remote_id);
                    }
                    debug!(batch_index, batch_size, notes_migrated = report.notes_migrated, "Note batch inserted");
                }
                Err(e) => {
                    report.failed_batches += 1;
                    warn!(batch_index, batch_size, error = %e, "Note batch failed; continuing with next batch");
                }
            }
        }
        id_map
    }

    /// Insert all reminders in one call, re-pointing note links at the
    /// migrated notes.
    async fn transfer_reminders(
        &self,
        target: &Identity,
        mut reminders: Vec<Reminder>,
        note_ids: &HashMap<RecordId, RecordId>,
        report: &mut MigrationReport,
    ) {
        if reminders.is_empty() {
            return;
        }

        for reminder in &mut reminders {
            if let Some(note_id) = reminder.note_id {
                let remapped = note_ids.get(&note_id).copied();
                if remapped.is_none() {
                    debug!(reminder_id = %reminder.id, note_id = %note_id, "Linked note was not migrated; dropping link");
                }
                reminder.note_id = remapped;
            }
        }

        let total = reminders.len();
        match self
            .remote
            .bulk_insert_reminders(&target.id, reminders)
            .await
        {
            Ok(inserted) => {
                report.reminders_migrated = inserted.len().min(total);
                debug!(reminders_migrated = report.reminders_migrated, "Reminders inserted");
            }
            Err(e) => {
                warn!(batch_size = total, error = %e, "Reminder insert failed; notes already migrated are kept");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAuthObserver, MockRemoteStore};
    use chrono::Utc;
    use driftnote_core::{CreateNoteRequest, CreateReminderRequest, QuotaLimits};
    use driftnote_local::MemoryBackend;

    fn fast_config() -> MigrationConfig {
        MigrationConfig::default()
            .with_settle(Duration::ZERO)
            .with_verify_backoff(Duration::ZERO)
    }

    async fn guest_store(notes: usize, reminders: usize) -> GuestStore {
        let store = GuestStore::new(
            Arc::new(MemoryBackend::new()),
            QuotaLimits::default()
                .with_max_notes(notes)
                .with_max_reminders(reminders),
        );
        store.ensure_profile().await.unwrap();
        for i in 0..notes {
            store
                .create_note(CreateNoteRequest::text(format!("note {i}"), "body"))
                .await
                .unwrap();
        }
        for i in 0..reminders {
            store
                .create_reminder(CreateReminderRequest::new(format!("r{i}"), Utc::now()))
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_config_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.settle, Duration::from_secs(2));
        assert_eq!(config.verify_attempts, 3);
        assert_eq!(config.verify_backoff, Duration::from_secs(1));
        assert_eq!(config.note_batch_size, 10);
    }

    #[test]
    fn test_config_clamps_to_one() {
        let config = MigrationConfig::default()
            .with_verify_attempts(0)
            .with_note_batch_size(0);
        assert_eq!(config.verify_attempts, 1);
        assert_eq!(config.note_batch_size, 1);
    }

    #[tokio::test]
    async fn test_empty_store_is_retired_without_remote_calls() {
        let store = guest_store(0, 0).await;
        let remote = MockRemoteStore::new();
        let auth = MockAuthObserver::new();
        let engine = MigrationEngine::new(Arc::new(auth.clone()), Arc::new(remote.clone()), fast_config());

        let report = engine.migrate(&store, &Identity::new("u1")).await.unwrap();
        assert_eq!(report, MigrationReport { guest_retired: true, ..Default::default() });
        assert!(remote.calls().is_empty());
        assert_eq!(auth.call_count(), 0);
        assert!(store.profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batches_notes_by_configured_size() {
        let store = guest_store(25, 0).await;
        let remote = MockRemoteStore::new();
        let auth = MockAuthObserver::signed_in(Identity::new("u1"));
        let engine = MigrationEngine::new(Arc::new(auth), Arc::new(remote.clone()), fast_config());

        let report = engine.migrate(&store, &Identity::new("u1")).await.unwrap();
        assert_eq!(report.notes_migrated, 25);
        assert_eq!(remote.note_batch_sizes(), vec![10, 10, 5]);
        assert_eq!(remote.notes_for("u1").len(), 25);
    }

    #[tokio::test]
    async fn test_reminder_links_follow_migrated_notes() {
        let store = GuestStore::new(Arc::new(MemoryBackend::new()), QuotaLimits::default());
        store.ensure_profile().await.unwrap();
        let note = store
            .create_note(CreateNoteRequest::text("linked", "body"))
            .await
            .unwrap();
        store
            .create_reminder(CreateReminderRequest::new("follow up", Utc::now()).with_note(note.id))
            .await
            .unwrap();
        store
            .create_reminder(
                CreateReminderRequest::new("dangling", Utc::now()).with_note(RecordId::new_guest()),
            )
            .await
            .unwrap();

        let remote = MockRemoteStore::new();
        let auth = MockAuthObserver::signed_in(Identity::new("u1"));
        let engine = MigrationEngine::new(Arc::new(auth), Arc::new(remote.clone()), fast_config());
        engine.migrate(&store, &Identity::new("u1")).await.unwrap();

        let remote_note = &remote.notes_for("u1")[0];
        let reminders = remote.reminders_for("u1");
        let linked = reminders.iter().find(|r| r.title == "follow up").unwrap();
        let dangling = reminders.iter().find(|r| r.title == "dangling").unwrap();
        assert_eq!(linked.note_id, Some(remote_note.id));
        assert_eq!(dangling.note_id, None);
    }

    #[tokio::test]
    async fn test_verification_retries_until_match() {
        let store = guest_store(1, 0).await;
        let auth = MockAuthObserver::new();
        auth.push_answer(None);
        auth.push_error("token refresh in flight");
        auth.set_current(Some(Identity::new("u1")));

        let remote = MockRemoteStore::new();
        let engine = MigrationEngine::new(Arc::new(auth.clone()), Arc::new(remote.clone()), fast_config());
        let report = engine.migrate(&store, &Identity::new("u1")).await.unwrap();

        assert_eq!(auth.call_count(), 3);
        assert_eq!(report.notes_migrated, 1);
    }

    #[tokio::test]
    async fn test_verification_reports_last_observed_identity() {
        let store = guest_store(1, 0).await;
        let auth = MockAuthObserver::signed_in(Identity::new("someone-else"));
        let remote = MockRemoteStore::new();
        let engine = MigrationEngine::new(Arc::new(auth), Arc::new(remote.clone()), fast_config());

        let err = engine.migrate(&store, &Identity::new("u1")).await.unwrap_err();
        match err {
            Error::SessionNotEstablished { expected, observed } => {
                assert_eq!(expected, "u1");
                assert_eq!(observed.as_deref(), Some("someone-else"));
            }
            other => panic!("Expected SessionNotEstablished, got {other:?}"),
        }
        assert!(remote.calls().is_empty());
        assert_eq!(store.list_notes().await.unwrap().len(), 1);
    }
}
