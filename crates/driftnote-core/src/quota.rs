//! Guest usage quota rules.
//!
//! [`check_quota`] is a pure decision over the current [`UsageCounters`]. The
//! guest store calls it, and honors the answer, before every create.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Guest create operations that consume quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaOperation {
    CreateNote,
    CreateReminder,
}

impl QuotaOperation {
    /// Plural noun for user-facing messages.
    pub fn noun(&self) -> &'static str {
        match self {
            QuotaOperation::CreateNote => "notes",
            QuotaOperation::CreateReminder => "reminders",
        }
    }
}

impl fmt::Display for QuotaOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaOperation::CreateNote => write!(f, "create_note"),
            QuotaOperation::CreateReminder => write!(f, "create_reminder"),
        }
    }
}

/// Fixed per-guest limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    pub max_notes: usize,
    pub max_reminders: usize,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_notes: defaults::MAX_GUEST_NOTES,
            max_reminders: defaults::MAX_GUEST_REMINDERS,
        }
    }
}

impl QuotaLimits {
    /// Create limits from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DRIFTNOTE_MAX_GUEST_NOTES` | `3` | Notes a guest may hold |
    /// | `DRIFTNOTE_MAX_GUEST_REMINDERS` | `2` | Active reminders a guest may hold |
    pub fn from_env() -> Self {
        let max_notes = std::env::var("DRIFTNOTE_MAX_GUEST_NOTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_GUEST_NOTES);

        let max_reminders = std::env::var("DRIFTNOTE_MAX_GUEST_REMINDERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_GUEST_REMINDERS);

        Self {
            max_notes,
            max_reminders,
        }
    }

    pub fn with_max_notes(mut self, max: usize) -> Self {
        self.max_notes = max;
        self
    }

    pub fn with_max_reminders(mut self, max: usize) -> Self {
        self.max_reminders = max;
        self
    }
}

/// Live guest usage against the configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub notes: usize,
    pub reminders: usize,
    pub max_notes: usize,
    pub max_reminders: usize,
}

impl UsageCounters {
    pub fn new(notes: usize, reminders: usize, limits: QuotaLimits) -> Self {
        Self {
            notes,
            reminders,
            max_notes: limits.max_notes,
            max_reminders: limits.max_reminders,
        }
    }

    /// Zero usage, as reported outside guest mode.
    pub fn empty(limits: QuotaLimits) -> Self {
        Self::new(0, 0, limits)
    }

    pub fn notes_remaining(&self) -> usize {
        self.max_notes.saturating_sub(self.notes)
    }

    pub fn reminders_remaining(&self) -> usize {
        self.max_reminders.saturating_sub(self.reminders)
    }
}

/// Why a create was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDenial {
    pub operation: QuotaOperation,
    pub current: usize,
    pub limit: usize,
}

impl fmt::Display for QuotaDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "guest limit reached: {} of {} {}",
            self.current,
            self.limit,
            self.operation.noun()
        )
    }
}

/// Result of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied(QuotaDenial),
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed)
    }

    /// Convert a denial into [`Error::QuotaExceeded`].
    pub fn into_result(self) -> Result<()> {
        match self {
            QuotaDecision::Allowed => Ok(()),
            QuotaDecision::Denied(denial) => Err(Error::QuotaExceeded {
                kind: denial.operation,
                limit: denial.limit,
            }),
        }
    }
}

/// Decide whether `op` may run against `counters`.
///
/// A create is allowed only while the post-create count stays within the limit.
pub fn check_quota(counters: &UsageCounters, op: QuotaOperation) -> QuotaDecision {
    let (current, limit) = match op {
        QuotaOperation::CreateNote => (counters.notes, counters.max_notes),
        QuotaOperation::CreateReminder => (counters.reminders, counters.max_reminders),
    };
    if current < limit {
        QuotaDecision::Allowed
    } else {
        QuotaDecision::Denied(QuotaDenial {
            operation: op,
            current,
            limit,
        })
    }
}
