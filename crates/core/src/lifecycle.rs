//! Dip lifecycle state machine.
//!
//! States: `active` (initial) -> `claimed` -> `completed`; `active` ->
//! `expired`. `expired` and `completed` are terminal. Every status
//! mutation in the system goes through [`validate_transition`] (or the
//! equivalent conditional UPDATE guard in `dibs-db`); no caller writes
//! the status field directly.
//!
//! Statuses are stored as TEXT in the database; the enum's `as_str`
//! values are the canonical wire and storage representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a dip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DipStatus {
    Active,
    Claimed,
    Expired,
    Completed,
}

/// A transition the state machine does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid dip status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: DipStatus,
    pub to: DipStatus,
}

impl DipStatus {
    /// Canonical storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Claimed => "claimed",
            Self::Expired => "expired",
            Self::Completed => "completed",
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Completed)
    }

    /// Whether the single-step transition `self -> to` is legal,
    /// ignoring the runtime guards (deadline, claimant, payment).
    pub fn can_transition_to(self, to: DipStatus) -> bool {
        matches!(
            (self, to),
            (Self::Active, Self::Claimed)
                | (Self::Active, Self::Expired)
                | (Self::Claimed, Self::Completed)
        )
    }
}

impl fmt::Display for DipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "claimed" => Ok(Self::Claimed),
            "expired" => Ok(Self::Expired),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown dip status '{other}'")),
        }
    }
}

/// Validate a single-step transition, rejecting skips and any move out
/// of a terminal state.
pub fn validate_transition(from: DipStatus, to: DipStatus) -> Result<(), InvalidTransition> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(InvalidTransition { from, to })
    }
}
