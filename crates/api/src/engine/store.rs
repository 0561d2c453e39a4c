//! Persistence seam for the claim engine and payment gate.

use async_trait::async_trait;

use dibs_core::types::DbId;
use dibs_db::models::dip::Dip;
use dibs_db::models::payment_authorization::{
    AuthorizationState, FinalizeOutcome, NewAuthorization, PaymentAuthorization,
};
use dibs_db::repositories::{DipRepo, PaymentAuthorizationRepo};
use dibs_db::DbPool;

/// The store operations the arbitrator and the gate depend on.
///
/// Every mutating method is a compare-and-swap: the status guard is part
/// of the write, `Ok(None)` means the guard did not hold at write time.
/// Implementations must make each call atomic with respect to concurrent
/// calls on the same row.
#[async_trait]
pub trait DipStore: Send + Sync {
    async fn fetch_dip(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error>;

    /// `active` -> `claimed` iff still active and not past its deadline.
    async fn claim_if_active(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error>;

    /// `active` -> `expired` iff overdue.
    async fn expire_if_overdue(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error>;

    /// `claimed` -> `completed`.
    async fn complete_if_claimed(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error>;

    async fn insert_authorization(
        &self,
        input: &NewAuthorization,
    ) -> Result<PaymentAuthorization, sqlx::Error>;

    async fn authorization_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error>;

    /// The still-`authorized` hold for a (dip, claimant) pair, if any.
    async fn live_authorization(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error>;

    /// `authorized` -> `outcome`, with idempotency resolved from the
    /// row's current state. `Ok(None)` means the reference is unknown.
    async fn finalize_authorization(
        &self,
        reference: &str,
        outcome: AuthorizationState,
    ) -> Result<Option<FinalizeOutcome>, sqlx::Error>;
}

/// Production store over the Postgres repositories.
#[derive(Clone)]
pub struct PgDipStore {
    pool: DbPool,
}

impl PgDipStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DipStore for PgDipStore {
    async fn fetch_dip(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        DipRepo::get(&self.pool, dip_id).await
    }

    async fn claim_if_active(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        DipRepo::claim_if_active(&self.pool, dip_id, claimer_id).await
    }

    async fn expire_if_overdue(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        DipRepo::expire_if_overdue(&self.pool, dip_id).await
    }

    async fn complete_if_claimed(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        DipRepo::complete_if_claimed(&self.pool, dip_id).await
    }

    async fn insert_authorization(
        &self,
        input: &NewAuthorization,
    ) -> Result<PaymentAuthorization, sqlx::Error> {
        PaymentAuthorizationRepo::create(&self.pool, input).await
    }

    async fn authorization_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error> {
        PaymentAuthorizationRepo::get_by_reference(&self.pool, reference).await
    }

    async fn live_authorization(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error> {
        PaymentAuthorizationRepo::live_for_claim(&self.pool, dip_id, claimer_id).await
    }

    async fn finalize_authorization(
        &self,
        reference: &str,
        outcome: AuthorizationState,
    ) -> Result<Option<FinalizeOutcome>, sqlx::Error> {
        PaymentAuthorizationRepo::finalize(&self.pool, reference, outcome).await
    }
}
