//! Guest quota policy checked through the public API only.

use driftnote_core::{
    check_quota, defaults, Error, QuotaDecision, QuotaLimits, QuotaOperation, UsageCounters,
};

/// Default limits are the documented guest allowance.
#[test]
fn test_default_limits() {
    let limits = QuotaLimits::default();
    assert_eq!(limits.max_notes, defaults::MAX_GUEST_NOTES);
    assert_eq!(limits.max_reminders, defaults::MAX_GUEST_REMINDERS);
    assert_eq!((limits.max_notes, limits.max_reminders), (3, 2));
}

/// Every count below the limit is allowed; the limit itself is denied.
#[test]
fn test_note_quota_boundary_for_any_limit() {
    for max in 0..6 {
        let limits = QuotaLimits::default().with_max_notes(max);
        for current in 0..=max {
            let decision = check_quota(
                &UsageCounters::new(current, 0, limits),
                QuotaOperation::CreateNote,
            );
            assert_eq!(decision.is_allowed(), current < max, "current={current} max={max}");
        }
    }
}

/// Note and reminder limits are independent.
#[test]
fn test_limits_are_independent() {
    let usage = UsageCounters::new(3, 0, QuotaLimits::default());
    assert!(!check_quota(&usage, QuotaOperation::CreateNote).is_allowed());
    assert!(check_quota(&usage, QuotaOperation::CreateReminder).is_allowed());
    assert_eq!(usage.notes_remaining(), 0);
    assert_eq!(usage.reminders_remaining(), 2);
}

/// A denial converts into the user-facing quota error.
#[test]
fn test_denial_into_error() {
    let usage = UsageCounters::new(0, 2, QuotaLimits::default());
    let decision = check_quota(&usage, QuotaOperation::CreateReminder);
    assert!(matches!(decision, QuotaDecision::Denied(_)));

    let err = decision.into_result().unwrap_err();
    assert!(err.is_quota_exceeded());
    assert!(matches!(
        err,
        Error::QuotaExceeded {
            kind: QuotaOperation::CreateReminder,
            limit: 2
        }
    ));
}
