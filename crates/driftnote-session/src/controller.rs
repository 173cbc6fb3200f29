//! The guest/account mode controller.
//!
//! One [`ModeController`] per process owns the [`ModeState`] and decides
//! which backend every CRUD call reaches:
//!
//! ```text
//! Uninitialized --(no identity)--> Guest
//! Uninitialized --(identity)-----> Authenticated   (migrating first if guest data exists)
//! Guest         --(signed in)----> Migrating --> Authenticated
//!                                            \-> Guest (session never verified)
//! Authenticated --(signed out)---> Guest
//! ```
//!
//! Transitions are serialized by a single lock, so a second auth event waits
//! until the first one, migration included, has fully settled. CRUD calls
//! never wait: while a transition is in progress they fail fast with
//! [`Error::Busy`].

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, watch, Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, error, info, instrument, warn};

use driftnote_core::{
    AuthEvent, AuthObserver, ContentAnalyzer, CreateNoteRequest, CreateReminderRequest, Error,
    EventBus, EventEnvelope, GuestProfile, Identity, MigrationReport, ModeState, Note, NoteType,
    RecordId, Reminder, RemoteStore, Result, SessionEvent, UpdateNoteRequest, UsageCounters,
};
use driftnote_local::GuestStore;

use crate::migration::{MigrationConfig, MigrationEngine};

/// Longest title derived from content when the analyzer returns none.
const FALLBACK_TITLE_CHARS: usize = 80;

/// Outcome of an auth-driven transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The controller settled in this mode without running a migration.
    Entered(ModeState),
    /// A migration ran and the controller is now `Authenticated`.
    Migrated(MigrationReport),
    /// The event was redundant for the current mode.
    Ignored,
}

#[derive(Debug, Default)]
struct Session {
    /// Signed-in account while `Authenticated`.
    identity: Option<Identity>,
    /// Identity whose migration aborted on session verification.
    pending: Option<Identity>,
}

/// Backend a CRUD call is dispatched to.
enum Target {
    Guest,
    Remote(String),
}

/// Process-wide state machine and unified CRUD surface.
pub struct ModeController {
    store: Arc<GuestStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthObserver>,
    engine: MigrationEngine,
    mode_tx: watch::Sender<ModeState>,
    session: RwLock<Session>,
    transition: Mutex<()>,
    events: EventBus,
    last_migration: RwLock<Option<MigrationReport>>,
}

impl ModeController {
    pub fn new(
        store: Arc<GuestStore>,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthObserver>,
        config: MigrationConfig,
    ) -> Self {
        let engine = MigrationEngine::new(auth.clone(), remote.clone(), config);
        let (mode_tx, _) = watch::channel(ModeState::Uninitialized);
        Self {
            store,
            remote,
            auth,
            engine,
            mode_tx,
            session: RwLock::new(Session::default()),
            transition: Mutex::new(()),
            events: EventBus::default(),
            last_migration: RwLock::new(None),
        }
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    pub fn current_mode(&self) -> ModeState {
        *self.mode_tx.borrow()
    }

    /// Receiver that observes every mode change.
    pub fn watch_mode(&self) -> watch::Receiver<ModeState> {
        self.mode_tx.subscribe()
    }

    /// Subscribe to mode and migration events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Report of the most recent completed migration.
    pub async fn last_migration(&self) -> Option<MigrationReport> {
        self.last_migration.read().await.clone()
    }

    /// Identity the current session runs under, if authenticated.
    pub async fn identity(&self) -> Option<Identity> {
        self.session.read().await.identity.clone()
    }

    /// Identity waiting for [`retry_migration`](Self::retry_migration).
    pub async fn pending_identity(&self) -> Option<Identity> {
        self.session.read().await.pending.clone()
    }

    fn set_mode(&self, to: ModeState) {
        let from = self.mode_tx.send_replace(to);
        if from != to {
            info!(from = %from, to = %to, "Mode transition");
            self.events.emit(SessionEvent::ModeChanged { from, to });
        }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Resolve the startup mode from the auth provider's current session.
    ///
    /// Queries the auth observer exactly once. A signed-in user who still has
    /// guest data on the device is migrated exactly as on a sign-in event.
    #[instrument(skip(self), fields(subsystem = "session", component = "mode_controller", op = "resolve_initial_state"))]
    pub async fn resolve_initial_state(&self) -> Result<Transition> {
        let _transition = self.transition.lock().await;
        let from = self.current_mode();
        if from != ModeState::Uninitialized {
            return Err(Error::InvalidTransition {
                from,
                event: "resolve_initial_state".to_string(),
            });
        }

        self.store.initialize().await?;
        let identity = self.auth.current_identity().await?;
        let has_guest_data = self.store.has_data().await?;
        match identity {
            Some(identity) if has_guest_data => {
                info!(identity_id = %identity.id, "Existing session with guest data; migrating");
                self.sign_in_locked(identity).await
            }
            Some(identity) => {
                debug!(identity_id = %identity.id, "Existing session, no guest data");
                if self.store.profile().await?.is_some() {
                    if let Err(e) = self.store.clear_all().await {
                        warn!(error = %e, "Failed to retire empty guest profile");
                    }
                }
                self.session.write().await.identity = Some(identity);
                self.set_mode(ModeState::Authenticated);
                Ok(Transition::Entered(ModeState::Authenticated))
            }
            None => {
                let profile = self.store.ensure_profile().await?;
                debug!(profile_id = %profile.id, "No session; running as guest");
                self.set_mode(ModeState::Guest);
                Ok(Transition::Entered(ModeState::Guest))
            }
        }
    }

    /// Handle a sign-in from the auth provider.
    #[instrument(skip(self, identity), fields(subsystem = "session", component = "mode_controller", op = "on_signed_in", identity_id = %identity.id))]
    pub async fn on_signed_in(&self, identity: Identity) -> Result<Transition> {
        let _transition = self.transition.lock().await;
        match self.current_mode() {
            ModeState::Guest | ModeState::Uninitialized => self.sign_in_locked(identity).await,
            ModeState::Authenticated => {
                let current = self.session.read().await.identity.clone();
                match current {
                    Some(current) if current.id == identity.id => {
                        debug!("Already signed in as this identity");
                        Ok(Transition::Ignored)
                    }
                    _ => {
                        warn!("Sign-in for a different identity while authenticated");
                        Err(Error::InvalidTransition {
                            from: ModeState::Authenticated,
                            event: AuthEvent::SignedIn(identity).name().to_string(),
                        })
                    }
                }
            }
            ModeState::Migrating => Err(Error::InvalidTransition {
                from: ModeState::Migrating,
                event: AuthEvent::SignedIn(identity).name().to_string(),
            }),
        }
    }

    /// Handle a sign-out from the auth provider.
    #[instrument(skip(self), fields(subsystem = "session", component = "mode_controller", op = "on_signed_out"))]
    pub async fn on_signed_out(&self) -> Result<Transition> {
        let _transition = self.transition.lock().await;
        match self.current_mode() {
            ModeState::Authenticated => {
                let mut session = self.session.write().await;

                // The account stays usable until the guest store is ready.
                let profile = match self.prepare_guest().await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!(error = %e, "Guest store unavailable; staying signed in");
                        return Err(e);
                    }
                };
                session.identity = None;
                session.pending = None;
                debug!(profile_id = %profile.id, "Fresh guest profile after sign-out");
                self.set_mode(ModeState::Guest);
                Ok(Transition::Entered(ModeState::Guest))
            }
            ModeState::Guest => {
                debug!("Already running as guest");
                Ok(Transition::Ignored)
            }
            from => Err(Error::InvalidTransition {
                from,
                event: AuthEvent::SignedOut.name().to_string(),
            }),
        }
    }

    async fn prepare_guest(&self) -> Result<GuestProfile> {
        self.store.initialize().await?;
        self.store.ensure_profile().await
    }

    /// Re-run the sign-in for the identity whose session verification failed.
    pub async fn retry_migration(&self) -> Result<Transition> {
        let pending = {
            let session = self.session.read().await;
            session.pending.clone()
        };
        match (self.current_mode(), pending) {
            (ModeState::Guest, Some(identity)) => {
                info!(identity_id = %identity.id, "Retrying guest migration");
                self.on_signed_in(identity).await
            }
            _ => Err(Error::NotFound("pending sign-in".to_string())),
        }
    }

    /// Apply one auth event.
    pub async fn on_auth_event(&self, event: AuthEvent) -> Result<Transition> {
        match event {
            AuthEvent::SignedIn(identity) => self.on_signed_in(identity).await,
            AuthEvent::SignedOut => self.on_signed_out().await,
        }
    }

    /// Consume an auth event stream until it ends, one event at a time.
    ///
    /// Each event is fully settled before the next is read. Failed transitions
    /// are logged and do not stop the pump.
    pub async fn run_auth_events<S>(&self, events: S)
    where
        S: Stream<Item = AuthEvent>,
    {
        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            let name = event.name();
            match self.on_auth_event(event).await {
                Ok(outcome) => debug!(event = name, outcome = ?outcome, "Auth event applied"),
                Err(e) => warn!(event = name, error = %e, "Auth event rejected"),
            }
        }
        debug!("Auth event stream ended");
    }

    /// Run the migration for `identity`. Caller holds the transition lock.
    async fn sign_in_locked(&self, identity: Identity) -> Result<Transition> {
        self.set_mode(ModeState::Migrating);
        // Waits for CRUD calls already dispatched to finish.
        let mut session = self.session.write().await;

        self.events.emit(SessionEvent::MigrationStarted {
            identity_id: identity.id.clone(),
        });

        match self.engine.migrate(&self.store, &identity).await {
            Ok(report) => {
                info!(identity_id = %identity.id, summary = %report.summary(), "Guest migrated");
                session.identity = Some(identity.clone());
                session.pending = None;
                *self.last_migration.write().await = Some(report.clone());
                self.set_mode(ModeState::Authenticated);
                self.events.emit(SessionEvent::MigrationCompleted {
                    identity_id: identity.id,
                    report: report.clone(),
                });
                Ok(Transition::Migrated(report))
            }
            Err(e @ Error::SessionNotEstablished { .. }) => {
                warn!(identity_id = %identity.id, error = %e, "Migration aborted; guest data kept");
                session.pending = Some(identity.clone());
                self.set_mode(ModeState::Guest);
                self.events.emit(SessionEvent::MigrationAborted {
                    identity_id: identity.id,
                    reason: e.to_string(),
                });
                Err(e)
            }
            Err(e) => {
                error!(identity_id = %identity.id, error = %e, "Migration failed before transfer; continuing as authenticated");
                session.identity = Some(identity.clone());
                session.pending = None;
                self.set_mode(ModeState::Authenticated);
                self.events.emit(SessionEvent::MigrationAborted {
                    identity_id: identity.id,
                    reason: e.to_string(),
                });
                Ok(Transition::Entered(ModeState::Authenticated))
            }
        }
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Pick the backend for a CRUD call, or fail fast with `Busy`.
    ///
    /// The returned guard keeps transitions from starting until the call is
    /// done.
    fn dispatch(&self) -> Result<(RwLockReadGuard<'_, Session>, Target)> {
        if !matches!(self.current_mode(), ModeState::Guest | ModeState::Authenticated) {
            return Err(Error::Busy);
        }
        let session = self.session.try_read().map_err(|_| Error::Busy)?;
        let target = match self.current_mode() {
            ModeState::Guest => Target::Guest,
            ModeState::Authenticated => match &session.identity {
                Some(identity) => Target::Remote(identity.id.clone()),
                None => return Err(Error::Internal("authenticated without identity".to_string())),
            },
            _ => return Err(Error::Busy),
        };
        Ok((session, target))
    }

    pub async fn create_note(&self, req: CreateNoteRequest) -> Result<Note> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest => self.store.create_note(req).await,
            Target::Remote(identity_id) => self.remote.create_note(&identity_id, req).await,
        }
    }

    pub async fn update_note(&self, id: RecordId, req: UpdateNoteRequest) -> Result<Note> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest if id.is_guest() => self.store.update_note(id, req).await,
            Target::Remote(identity_id) if !id.is_guest() => {
                self.remote.update_note(&identity_id, id, req).await
            }
            _ => Err(Error::NoteNotFound(id)),
        }
    }

    pub async fn delete_note(&self, id: RecordId) -> Result<()> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest if id.is_guest() => self.store.delete_note(id).await,
            Target::Remote(identity_id) if !id.is_guest() => {
                self.remote.delete_note(&identity_id, id).await
            }
            _ => Err(Error::NoteNotFound(id)),
        }
    }

    pub async fn get_note(&self, id: RecordId) -> Result<Note> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest if id.is_guest() => self.store.get_note(id).await,
            Target::Remote(identity_id) if !id.is_guest() => {
                self.remote.get_note(&identity_id, id).await
            }
            _ => Err(Error::NoteNotFound(id)),
        }
    }

    /// Notes in the active backend, newest first.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest => self.store.list_notes().await,
            Target::Remote(identity_id) => self.remote.list_notes(&identity_id).await,
        }
    }

    pub async fn create_reminder(&self, req: CreateReminderRequest) -> Result<Reminder> {
        let (_session, target) = self.dispatch()?;
        let guest = matches!(target, Target::Guest);
        if let Some(note_id) = req.note_id {
            if note_id.is_guest() != guest {
                return Err(Error::InvalidInput(format!(
                    "note {note_id} does not belong to the active backend"
                )));
            }
        }
        match target {
            Target::Guest => self.store.create_reminder(req).await,
            Target::Remote(identity_id) => self.remote.create_reminder(&identity_id, req).await,
        }
    }

    pub async fn complete_reminder(&self, id: RecordId) -> Result<Reminder> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest if id.is_guest() => self.store.complete_reminder(id).await,
            Target::Remote(identity_id) if !id.is_guest() => {
                self.remote.complete_reminder(&identity_id, id).await
            }
            _ => Err(Error::ReminderNotFound(id)),
        }
    }

    pub async fn delete_reminder(&self, id: RecordId) -> Result<()> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest if id.is_guest() => self.store.delete_reminder(id).await,
            Target::Remote(identity_id) if !id.is_guest() => {
                self.remote.delete_reminder(&identity_id, id).await
            }
            _ => Err(Error::ReminderNotFound(id)),
        }
    }

    /// Active reminders, soonest first.
    pub async fn list_active_reminders(&self) -> Result<Vec<Reminder>> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest => self.store.list_active_reminders().await,
            Target::Remote(identity_id) => self.remote.list_active_reminders(&identity_id).await,
        }
    }

    /// Guest quota usage. Zero counts outside guest mode.
    pub async fn usage(&self) -> Result<UsageCounters> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest => self.store.usage().await,
            Target::Remote(_) => Ok(UsageCounters::empty(self.store.limits())),
        }
    }

    /// The guest profile, while in guest mode.
    pub async fn guest_profile(&self) -> Result<Option<GuestProfile>> {
        let (_session, target) = self.dispatch()?;
        match target {
            Target::Guest => self.store.profile().await,
            Target::Remote(_) => Ok(None),
        }
    }

    /// Capture raw content as a note, titled and tagged by `analyzer`.
    ///
    /// `location` is the source URL for text and links, or the stored file
    /// URL for files and images.
    pub async fn capture(
        &self,
        content: &str,
        note_type: NoteType,
        location: Option<String>,
        analyzer: &dyn ContentAnalyzer,
    ) -> Result<Note> {
        // Fail before paying for analysis.
        drop(self.dispatch()?);

        let analysis = analyzer.analyze(content, note_type).await?;
        let title = if analysis.title.trim().is_empty() {
            fallback_title(content)
        } else {
            analysis.title
        };

        let mut req = CreateNoteRequest::text(title, content)
            .with_summary(analysis.summary)
            .with_tags(analysis.tags)
            .with_type(note_type);
        match note_type {
            NoteType::File | NoteType::Image => req.file_url = location,
            NoteType::Text | NoteType::Url => req.source_url = location,
        }
        self.create_note(req).await
    }
}

fn fallback_title(content: &str) -> String {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let title: String = first_line.trim().chars().take(FALLBACK_TITLE_CHARS).collect();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}
