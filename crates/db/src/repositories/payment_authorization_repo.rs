//! Repository for the `payment_authorizations` table.
//!
//! `finalize` mirrors the dip lifecycle updates: a conditional UPDATE
//! keyed on the expected `authorized` state, with the idempotency rules
//! resolved from whatever state the row turns out to hold.

use dibs_core::types::DbId;
use sqlx::PgPool;

use crate::models::payment_authorization::{
    AuthorizationState, FinalizeOutcome, NewAuthorization, PaymentAuthorization,
};

/// Column list for `payment_authorizations` queries.
const COLUMNS: &str = "\
    id, reference, dip_id, claimer_id, amount, platform_fee, state, \
    created_at, finalized_at";

/// Provides persistence for payment authorizations.
pub struct PaymentAuthorizationRepo;

impl PaymentAuthorizationRepo {
    /// Record a freshly created processor hold.
    ///
    /// The partial unique index `uq_payment_authorizations_live` rejects
    /// a second live (non-voided) authorization for the same
    /// (dip, claimant) pair with a 23505, which the API layer maps to a
    /// conflict.
    pub async fn create(
        pool: &PgPool,
        input: &NewAuthorization,
    ) -> Result<PaymentAuthorization, sqlx::Error> {
        let query = format!(
            "INSERT INTO payment_authorizations \
                 (reference, dip_id, claimer_id, amount, platform_fee, state) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PaymentAuthorization>(&query)
            .bind(&input.reference)
            .bind(input.dip_id)
            .bind(input.claimer_id)
            .bind(input.amount)
            .bind(input.platform_fee)
            .bind(AuthorizationState::Authorized.as_str())
            .fetch_one(pool)
            .await
    }

    /// Fetch by processor reference.
    pub async fn get_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payment_authorizations WHERE reference = $1"
        );
        sqlx::query_as::<_, PaymentAuthorization>(&query)
            .bind(reference)
            .fetch_optional(pool)
            .await
    }

    /// The live (still `authorized`) hold for a (dip, claimant) pair.
    pub async fn live_for_claim(
        pool: &PgPool,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payment_authorizations \
             WHERE dip_id = $1 AND claimer_id = $2 AND state = $3 \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, PaymentAuthorization>(&query)
            .bind(dip_id)
            .bind(claimer_id)
            .bind(AuthorizationState::Authorized.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Conditionally finalize an authorization as captured or voided.
    ///
    /// Exactly one writer can move the row out of `authorized`. When the
    /// guard misses, the current state decides between idempotent no-op
    /// (same outcome) and conflict (different outcome). `Ok(None)` means
    /// the reference is unknown.
    pub async fn finalize(
        pool: &PgPool,
        reference: &str,
        outcome: AuthorizationState,
    ) -> Result<Option<FinalizeOutcome>, sqlx::Error> {
        let query = format!(
            "UPDATE payment_authorizations \
             SET state = $2, finalized_at = NOW() \
             WHERE reference = $1 AND state = $3 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PaymentAuthorization>(&query)
            .bind(reference)
            .bind(outcome.as_str())
            .bind(AuthorizationState::Authorized.as_str())
            .fetch_optional(pool)
            .await?;

        if let Some(row) = updated {
            return Ok(Some(FinalizeOutcome::Applied(row)));
        }

        match Self::get_by_reference(pool, reference).await? {
            None => Ok(None),
            Some(row) if row.state == outcome.as_str() => {
                Ok(Some(FinalizeOutcome::NoOp(row)))
            }
            Some(row) => Ok(Some(FinalizeOutcome::Conflict { current: row.state })),
        }
    }
}
