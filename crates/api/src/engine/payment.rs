//! The payment gate: places and finalizes holds against the live dip
//! state.
//!
//! `authorize` validates the request against a fresh snapshot (liveness,
//! ownership, exact price), places the processor hold, then records it.
//! The partial unique index on live (dip, claimant) pairs backstops a
//! double-submit: the second insert fails and its orphaned hold is
//! released. Finalization is idempotent per direction and conflicts
//! across directions.

use std::sync::Arc;

use chrono::Utc;

use dibs_core::countdown::is_expired;
use dibs_core::error::{CoreError, PaymentError};
use dibs_core::fee::platform_fee;
use dibs_core::types::{DbId, MinorUnits};
use dibs_db::models::payment_authorization::{
    AuthorizationState, FinalizeOutcome, NewAuthorization, PaymentAuthorization,
};
use dibs_payments::{AuthorizationRequest, PaymentProcessor};

use crate::config::ClaimConfig;
use crate::engine::store::DipStore;
use crate::error::is_unique_violation;

/// Name of the partial unique index guarding live (dip, claimant) pairs.
const LIVE_AUTHORIZATION_INDEX: &str = "uq_payment_authorizations_live";

/// Places and finalizes payment holds over a [`DipStore`].
pub struct PaymentGate<S> {
    store: S,
    processor: Arc<dyn PaymentProcessor>,
    config: ClaimConfig,
}

impl<S: DipStore> PaymentGate<S> {
    pub fn new(store: S, processor: Arc<dyn PaymentProcessor>, config: ClaimConfig) -> Self {
        Self {
            store,
            processor,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Place a hold for `claimer_id` over `dip_id` at exactly `amount`.
    ///
    /// `amount` must equal the live dip price; a mismatch means the
    /// client acted on stale state and must refresh before paying.
    pub async fn authorize(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
        amount: MinorUnits,
    ) -> Result<PaymentAuthorization, PaymentError> {
        let dip = self
            .store
            .fetch_dip(dip_id)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::DipNotFound(dip_id))?;

        if !dip.is_active() || is_expired(dip.available_until, Utc::now()) {
            return Err(PaymentError::DipNotAvailable);
        }
        if dip.owner_id == claimer_id {
            return Err(PaymentError::OwnClaimForbidden);
        }
        if amount != dip.price {
            return Err(PaymentError::PriceMismatch);
        }

        let fee = platform_fee(dip.price, self.config.platform_fee_percent);
        let request = AuthorizationRequest {
            amount: dip.price,
            currency: self.config.currency.clone(),
            platform_fee: fee,
            dip_id,
            claimer_id,
            owner_id: dip.owner_id,
        };
        let reference = self
            .processor
            .authorize(&request)
            .await
            .map_err(|e| PaymentError::Processor(e.to_string()))?;

        let input = NewAuthorization {
            reference: reference.clone(),
            dip_id,
            claimer_id,
            amount: dip.price,
            platform_fee: fee,
        };
        match self.store.insert_authorization(&input).await {
            Ok(auth) => {
                tracing::info!(
                    reference = %auth.reference,
                    dip_id = %dip_id,
                    claimer_id = %claimer_id,
                    amount = auth.amount,
                    platform_fee = auth.platform_fee,
                    "Payment authorized"
                );
                Ok(auth)
            }
            Err(e) => {
                // The hold exists at the processor but has no row; let it
                // go so it cannot be settled.
                self.release_orphaned_hold(&reference).await;
                if is_unique_violation(&e, LIVE_AUTHORIZATION_INDEX) {
                    Err(PaymentError::Core(CoreError::Conflict(
                        "A live authorization for this dip already exists".into(),
                    )))
                } else {
                    Err(db_err(e))
                }
            }
        }
    }

    /// Settle an authorized hold.
    pub async fn capture(&self, reference: &str) -> Result<PaymentAuthorization, PaymentError> {
        self.finalize(reference, AuthorizationState::Captured).await
    }

    /// Release an authorized hold.
    pub async fn void(&self, reference: &str) -> Result<PaymentAuthorization, PaymentError> {
        self.finalize(reference, AuthorizationState::Voided).await
    }

    /// Look up a hold by reference.
    pub async fn get(&self, reference: &str) -> Result<PaymentAuthorization, PaymentError> {
        self.store
            .authorization_by_reference(reference)
            .await
            .map_err(db_err)?
            .ok_or_else(|| PaymentError::AuthorizationNotFound(reference.to_string()))
    }

    async fn finalize(
        &self,
        reference: &str,
        outcome: AuthorizationState,
    ) -> Result<PaymentAuthorization, PaymentError> {
        let row = self.get(reference).await?;

        // Repeating an already-applied finalize is a no-op; the
        // processor was already told the first time.
        if row.state == outcome.as_str() {
            return Ok(row);
        }
        if !row.is_authorized() {
            return Err(PaymentError::AlreadyFinalized { state: row.state });
        }

        match outcome {
            AuthorizationState::Captured => self.processor.capture(reference).await,
            AuthorizationState::Voided => self.processor.void(reference).await,
            AuthorizationState::Authorized => {
                return Err(PaymentError::Core(CoreError::Internal(
                    "cannot finalize back to authorized".into(),
                )))
            }
        }
        .map_err(|e| PaymentError::Processor(e.to_string()))?;

        match self
            .store
            .finalize_authorization(reference, outcome)
            .await
            .map_err(db_err)?
        {
            Some(FinalizeOutcome::Applied(row)) | Some(FinalizeOutcome::NoOp(row)) => {
                tracing::info!(reference, state = %row.state, "Authorization finalized");
                Ok(row)
            }
            Some(FinalizeOutcome::Conflict { current }) => {
                Err(PaymentError::AlreadyFinalized { state: current })
            }
            None => Err(PaymentError::AuthorizationNotFound(reference.to_string())),
        }
    }

    /// Best-effort void of a processor hold that never got a row.
    async fn release_orphaned_hold(&self, reference: &str) {
        if let Err(e) = self.processor.void(reference).await {
            tracing::error!(reference, error = %e, "Failed to void orphaned hold");
        }
    }
}

fn db_err(e: sqlx::Error) -> PaymentError {
    PaymentError::Core(CoreError::Internal(format!("store error: {e}")))
}
