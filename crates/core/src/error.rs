//! Error taxonomy shared across the workspace.
//!
//! Three tiers, mirroring how failures are reported to callers:
//!
//! - [`CoreError`] -- generic domain failures (not-found, validation,
//!   conflict, auth) that the API layer maps to HTTP statuses.
//! - [`ClaimError`] / [`PaymentError`] / [`RatingError`] -- per-operation
//!   taxonomies for the claim arbitrator, the payment gate, and the
//!   rating aggregator. None of these is fatal to the process; every one
//!   is a per-request outcome.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome taxonomy for `attempt_claim`.
///
/// The first five variants are precondition failures: reported verbatim,
/// no retry, no side effect. `AlreadyClaimed` is contention -- expected
/// under concurrent use, the caller should refresh and show the dip as
/// unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Dip {0} not found")]
    DipNotFound(DbId),

    /// The dip exists but is no longer `active` (claimed, expired, or
    /// completed before this attempt started).
    #[error("Dip is not available")]
    DipNotActive,

    /// Measured distance exceeds the proximity threshold. Carries the
    /// measured distance (whole meters) so the caller can show how much
    /// closer the claimant needs to be.
    #[error("Too far away: {distance_meters}m (must be within {threshold_meters}m)")]
    TooFarAway {
        distance_meters: i64,
        threshold_meters: i64,
    },

    #[error("You cannot claim your own dip")]
    OwnClaimForbidden,

    /// No usable authorization: unknown reference, wrong state, or held
    /// by a different claimant.
    #[error("Payment is not authorized for this claim")]
    PaymentNotAuthorized,

    /// The authorization exists but does not match this dip or its
    /// exact price.
    #[error("Payment authorization does not match this dip")]
    PaymentMismatch,

    /// Another claimant won the compare-and-swap. The loser's
    /// authorization is voided, never captured.
    #[error("Dip was claimed by someone else")]
    AlreadyClaimed,

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Outcome taxonomy for the payment gate.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Dip {0} not found")]
    DipNotFound(DbId),

    #[error("Dip is not available")]
    DipNotAvailable,

    /// The submitted amount does not equal the live dip price. Protects
    /// against stale client state after a status or price change.
    #[error("Amount does not match the dip price")]
    PriceMismatch,

    #[error("You cannot pay for your own dip")]
    OwnClaimForbidden,

    #[error("Authorization {0} not found")]
    AuthorizationNotFound(String),

    /// A conflicting finalize after the authorization already reached a
    /// terminal state. The prior state is left unchanged.
    #[error("Authorization already finalized as {state}")]
    AlreadyFinalized { state: String },

    /// Surfaced verbatim from the external processor; the user must
    /// re-attempt deliberately, card/funds issues rarely self-resolve.
    #[error("Payment processor error: {0}")]
    Processor(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Outcome taxonomy for rating submission.
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Score must be between 1 and 5, got {0}")]
    InvalidScore(i16),

    /// A user rates the counterpart of a given exchange at most once.
    #[error("You have already rated this exchange")]
    AlreadyRated,

    /// The dip is not completed, or the rater/rated pair is not the
    /// owner/claimer pair of the exchange.
    #[error("Not a completed exchange between these users")]
    InvalidExchange,

    #[error(transparent)]
    Core(#[from] CoreError),
}
