//! Session event types and event bus for UI notifications.
//!
//! The mode controller emits a [`SessionEvent`] for every mode change and for
//! each stage of a migration. UI layers subscribe independently, e.g. to show
//! a "migrated 3 of 5 notes" toast.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{MigrationReport, ModeState};

/// Session lifecycle event.
///
/// Serialized as JSON with a `type` tag field, e.g.
/// `{"type":"ModeChanged","from":"guest","to":"migrating"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The active mode changed.
    ModeChanged { from: ModeState, to: ModeState },
    /// A migration began for this identity.
    MigrationStarted { identity_id: String },
    /// A migration settled; the report may be partial.
    MigrationCompleted {
        identity_id: String,
        report: MigrationReport,
    },
    /// Session verification failed; guest data was kept.
    MigrationAborted { identity_id: String, reason: String },
}

impl SessionEvent {
    /// Dot-namespaced event name (e.g. `"migration.completed"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::ModeChanged { .. } => "mode.changed",
            SessionEvent::MigrationStarted { .. } => "migration.started",
            SessionEvent::MigrationCompleted { .. } => "migration.completed",
            SessionEvent::MigrationAborted { .. } => "migration.aborted",
        }
    }
}

/// Event with delivery metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: SessionEvent,
}

impl EventEnvelope {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.event_type().to_string(),
            occurred_at: Utc::now(),
            payload: event,
        }
    }
}

/// Broadcast-based event bus for session events.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: SessionEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive events. Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
