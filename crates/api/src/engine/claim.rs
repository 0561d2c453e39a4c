//! The claim arbitrator.
//!
//! At most one claimant wins a dip. Preconditions (liveness, proximity,
//! ownership, payment) are checked in order against a snapshot, then the
//! actual decision is a single compare-and-swap in the store: whichever
//! request's guard holds at write time wins, every rival observes the
//! missed guard and is told [`ClaimError::AlreadyClaimed`]. A loser's
//! payment hold is voided, never captured.

use std::sync::Arc;

use chrono::Utc;

use dibs_core::countdown::is_expired;
use dibs_core::error::{ClaimError, CoreError};
use dibs_core::geo::{distance_meters, Location};
use dibs_core::lifecycle::DipStatus;
use dibs_core::types::DbId;
use dibs_db::models::dip::Dip;
use dibs_db::models::payment_authorization::{AuthorizationState, PaymentAuthorization};
use dibs_events::{DipEvent, EventBus};
use dibs_payments::PaymentProcessor;

use crate::config::ClaimConfig;
use crate::engine::store::DipStore;

/// Arbitrates claim attempts and completions over a [`DipStore`].
pub struct ClaimEngine<S> {
    store: S,
    processor: Arc<dyn PaymentProcessor>,
    bus: Arc<EventBus>,
    config: ClaimConfig,
}

impl<S: DipStore> ClaimEngine<S> {
    pub fn new(
        store: S,
        processor: Arc<dyn PaymentProcessor>,
        bus: Arc<EventBus>,
        config: ClaimConfig,
    ) -> Self {
        Self {
            store,
            processor,
            bus,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Attempt to claim `dip_id` for `claimer_id`, standing at
    /// `claimer_location`, paying with the hold behind
    /// `payment_reference`.
    ///
    /// Returns the claimed dip on a win. Every error is a per-request
    /// outcome; the dip is never left in an intermediate state.
    pub async fn attempt_claim(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
        claimer_location: Location,
        payment_reference: &str,
    ) -> Result<Dip, ClaimError> {
        let dip = self
            .store
            .fetch_dip(dip_id)
            .await
            .map_err(db_err)?
            .ok_or(ClaimError::DipNotFound(dip_id))?;

        // Lazy expiry: an overdue dip is retired by the first request
        // that observes it, claim attempts included.
        if dip.is_active() && is_expired(dip.available_until, Utc::now()) {
            self.expire_and_publish(dip_id).await;
            return Err(ClaimError::DipNotActive);
        }

        check_preconditions(
            &dip,
            claimer_id,
            claimer_location,
            self.config.proximity_threshold_meters,
        )?;

        let auth = self
            .store
            .authorization_by_reference(payment_reference)
            .await
            .map_err(db_err)?
            .ok_or(ClaimError::PaymentNotAuthorized)?;
        check_authorization(&auth, &dip, claimer_id)?;

        // The decision point. Everything before this line was advisory.
        let won = self
            .store
            .claim_if_active(dip_id, claimer_id)
            .await
            .map_err(db_err)?;

        match won {
            Some(claimed) => {
                self.capture_hold(payment_reference).await;
                self.bus
                    .publish(DipEvent::update(claimed.clone(), Some(claimer_id)));
                tracing::info!(
                    dip_id = %dip_id,
                    claimer_id = %claimer_id,
                    "Claim won"
                );
                Ok(claimed)
            }
            None => self.resolve_lost_claim(dip_id, claimer_id, payment_reference).await,
        }
    }

    /// The compare-and-swap missed: find out why and clean up.
    async fn resolve_lost_claim(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
        payment_reference: &str,
    ) -> Result<Dip, ClaimError> {
        let current = self
            .store
            .fetch_dip(dip_id)
            .await
            .map_err(db_err)?
            .ok_or(ClaimError::DipNotFound(dip_id))?;

        match current.status().map_err(ClaimError::Core)? {
            DipStatus::Claimed | DipStatus::Completed => {
                // A redelivered request from the winner themselves is
                // an idempotent success, not a loss.
                if current.claimer_id == Some(claimer_id) {
                    return Ok(current);
                }
                self.void_hold(payment_reference).await;
                tracing::info!(
                    dip_id = %dip_id,
                    claimer_id = %claimer_id,
                    "Claim lost to rival; hold voided"
                );
                Err(ClaimError::AlreadyClaimed)
            }
            DipStatus::Active => {
                // The guard missed on the deadline, not the status.
                self.expire_and_publish(dip_id).await;
                Err(ClaimError::DipNotActive)
            }
            DipStatus::Expired => Err(ClaimError::DipNotActive),
        }
    }

    /// Mark a claimed exchange completed. Either participant may call
    /// this; repeating it after completion is a no-op returning the
    /// completed dip.
    pub async fn complete(&self, dip_id: DbId, user_id: DbId) -> Result<Dip, ClaimError> {
        let dip = self
            .store
            .fetch_dip(dip_id)
            .await
            .map_err(db_err)?
            .ok_or(ClaimError::DipNotFound(dip_id))?;

        if dip.owner_id != user_id && dip.claimer_id != Some(user_id) {
            return Err(ClaimError::Core(CoreError::Forbidden(
                "Only the owner or the claimer can complete an exchange".into(),
            )));
        }

        match dip.status().map_err(ClaimError::Core)? {
            DipStatus::Completed => return Ok(dip),
            DipStatus::Claimed => {}
            DipStatus::Active | DipStatus::Expired => return Err(ClaimError::DipNotActive),
        }

        let completed = match self
            .store
            .complete_if_claimed(dip_id)
            .await
            .map_err(db_err)?
        {
            Some(completed) => completed,
            // Lost a race against the other participant's completion.
            None => {
                let current = self
                    .store
                    .fetch_dip(dip_id)
                    .await
                    .map_err(db_err)?
                    .ok_or(ClaimError::DipNotFound(dip_id))?;
                if current.status().map_err(ClaimError::Core)? == DipStatus::Completed {
                    return Ok(current);
                }
                return Err(ClaimError::DipNotActive);
            }
        };

        // Settlement normally happened at claim time; this retries it if
        // the capture failed back then. Re-finalizing a captured hold is
        // a no-op.
        if let Some(claimer_id) = completed.claimer_id {
            match self.store.live_authorization(dip_id, claimer_id).await {
                Ok(Some(auth)) if auth.is_authorized() => {
                    self.capture_hold(&auth.reference).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(dip_id = %dip_id, error = %e, "Settlement lookup failed");
                }
            }
        }

        self.bus
            .publish(DipEvent::update(completed.clone(), Some(user_id)));
        tracing::info!(dip_id = %dip_id, user_id = %user_id, "Exchange completed");
        Ok(completed)
    }

    /// Expire an overdue dip and broadcast the transition. Failures are
    /// logged, not propagated: the caller's answer does not depend on
    /// whether this bookkeeping write landed first.
    pub async fn expire_and_publish(&self, dip_id: DbId) {
        match self.store.expire_if_overdue(dip_id).await {
            Ok(Some(expired)) => {
                self.bus.publish(DipEvent::update(expired, None));
                tracing::info!(dip_id = %dip_id, "Dip lazily expired");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(dip_id = %dip_id, error = %e, "Lazy expiry failed");
            }
        }
    }

    /// Settle the winner's hold. A failure leaves the claim standing;
    /// completion retries the capture.
    async fn capture_hold(&self, reference: &str) {
        if let Err(e) = self.processor.capture(reference).await {
            tracing::error!(reference, error = %e, "Capture failed; will retry at completion");
            return;
        }
        if let Err(e) = self
            .store
            .finalize_authorization(reference, AuthorizationState::Captured)
            .await
        {
            tracing::error!(reference, error = %e, "Recording capture failed");
        }
    }

    /// Release a loser's hold. Best effort: the hold is unusable for any
    /// other dip either way, and processors time unsettled holds out.
    async fn void_hold(&self, reference: &str) {
        if let Err(e) = self.processor.void(reference).await {
            tracing::error!(reference, error = %e, "Void failed");
            return;
        }
        if let Err(e) = self
            .store
            .finalize_authorization(reference, AuthorizationState::Voided)
            .await
        {
            tracing::error!(reference, error = %e, "Recording void failed");
        }
    }
}

/// Ordered precondition checks against a snapshot of the dip.
///
/// Pure so the ordering is testable in isolation: liveness, then
/// proximity, then self-claim. Payment is checked separately because it
/// needs the authorization row.
pub fn check_preconditions(
    dip: &Dip,
    claimer_id: DbId,
    claimer_location: Location,
    threshold_meters: f64,
) -> Result<(), ClaimError> {
    if !dip.is_active() {
        return Err(ClaimError::DipNotActive);
    }

    let distance = distance_meters(claimer_location, dip.location())
        .map_err(|e| ClaimError::Core(CoreError::Validation(e.to_string())))?;
    if distance > threshold_meters {
        return Err(ClaimError::TooFarAway {
            distance_meters: distance.round() as i64,
            threshold_meters: threshold_meters.round() as i64,
        });
    }

    if dip.owner_id == claimer_id {
        return Err(ClaimError::OwnClaimForbidden);
    }

    Ok(())
}

/// Check that `auth` is a usable hold for this claimant and dip.
///
/// A hold belonging to someone else or no longer `authorized` reads as
/// missing; a hold for the wrong dip or amount is a mismatch the
/// claimant can fix by re-authorizing.
pub fn check_authorization(
    auth: &PaymentAuthorization,
    dip: &Dip,
    claimer_id: DbId,
) -> Result<(), ClaimError> {
    if auth.claimer_id != claimer_id || !auth.is_authorized() {
        return Err(ClaimError::PaymentNotAuthorized);
    }
    if auth.dip_id != dip.id || auth.amount != dip.price {
        return Err(ClaimError::PaymentMismatch);
    }
    Ok(())
}

fn db_err(e: sqlx::Error) -> ClaimError {
    ClaimError::Core(CoreError::Internal(format!("store error: {e}")))
}
