//! Payment authorization model: the hold-then-settle record correlating
//! a processor reference to exactly one dip and one claimant.

use std::fmt;
use std::str::FromStr;

use dibs_core::types::{DbId, MinorUnits, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Finalization state of an authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    /// Funds held, not yet settled or released.
    Authorized,
    /// Funds settled to the platform.
    Captured,
    /// Hold released; the authorization can never be captured.
    Voided,
}

impl AuthorizationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Captured => "captured",
            Self::Voided => "voided",
        }
    }

    /// Terminal states cannot be re-finalized with a different outcome.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Captured | Self::Voided)
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorizationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorized" => Ok(Self::Authorized),
            "captured" => Ok(Self::Captured),
            "voided" => Ok(Self::Voided),
            other => Err(format!("unknown authorization state '{other}'")),
        }
    }
}

/// A row from the `payment_authorizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentAuthorization {
    pub id: DbId,
    /// Opaque reference issued by the external processor.
    pub reference: String,
    pub dip_id: DbId,
    pub claimer_id: DbId,
    /// Held amount; equals the dip price at authorization time.
    pub amount: MinorUnits,
    /// Platform fee computed at authorization time, for display and
    /// payout math only -- never added to the claimer's charge.
    pub platform_fee: MinorUnits,
    pub state: String,
    pub created_at: Timestamp,
    pub finalized_at: Option<Timestamp>,
}

impl PaymentAuthorization {
    pub fn is_authorized(&self) -> bool {
        self.state == AuthorizationState::Authorized.as_str()
    }
}

/// Insert payload for a freshly created hold.
#[derive(Debug, Clone)]
pub struct NewAuthorization {
    pub reference: String,
    pub dip_id: DbId,
    pub claimer_id: DbId,
    pub amount: MinorUnits,
    pub platform_fee: MinorUnits,
}

/// Result of the conditional finalize update.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    /// The state moved from `authorized` to the requested outcome.
    Applied(PaymentAuthorization),
    /// Already finalized with the same outcome -- a no-op.
    NoOp(PaymentAuthorization),
    /// Already finalized with a conflicting outcome; nothing changed.
    Conflict { current: String },
}
