//! Remaining-time prediction against an absolute deadline.
//!
//! Used two ways: clients derive a ticking countdown for display, and
//! the server derives the authoritative expired/not-expired decision for
//! lazy expiry. Both share the same comparison so they cannot disagree.

use crate::types::Timestamp;

/// Time remaining until a deadline, broken down for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TimeLeft {
    /// Total remaining milliseconds; 0 once expired.
    pub total_ms: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
}

/// Compute the time left until `deadline` as of `now`.
pub fn time_left(deadline: Timestamp, now: Timestamp) -> TimeLeft {
    let diff_ms = (deadline - now).num_milliseconds();
    if diff_ms <= 0 {
        return TimeLeft {
            total_ms: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            expired: true,
        };
    }
    TimeLeft {
        total_ms: diff_ms,
        hours: diff_ms / (1000 * 60 * 60),
        minutes: (diff_ms / (1000 * 60)) % 60,
        seconds: (diff_ms / 1000) % 60,
        expired: false,
    }
}

/// Authoritative expiry check: a deadline is expired once `now` reaches it.
pub fn is_expired(deadline: Timestamp, now: Timestamp) -> bool {
    now >= deadline
}
