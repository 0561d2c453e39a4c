//! Shared fixtures: an in-memory [`DipStore`] with the same
//! compare-and-swap semantics as the Postgres store, and a recording
//! payment processor.

#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use dibs_api::config::ClaimConfig;
use dibs_api::engine::claim::ClaimEngine;
use dibs_api::engine::payment::PaymentGate;
use dibs_api::engine::store::DipStore;
use dibs_core::lifecycle::DipStatus;
use dibs_core::types::{DbId, MinorUnits, Timestamp};
use dibs_db::models::dip::Dip;
use dibs_db::models::payment_authorization::{
    AuthorizationState, FinalizeOutcome, NewAuthorization, PaymentAuthorization,
};
use dibs_events::EventBus;
use dibs_payments::{AuthorizationRequest, PaymentProcessor, ProcessorError};

// ---------------------------------------------------------------------------
// MemStore
// ---------------------------------------------------------------------------

/// In-memory store. One mutex over all state makes every operation
/// atomic with respect to concurrent callers, mirroring the row-level
/// atomicity of the SQL compare-and-swap updates.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    dips: HashMap<DbId, Dip>,
    auths: HashMap<String, PaymentAuthorization>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_dip(&self, dip: Dip) {
        self.inner.lock().unwrap().dips.insert(dip.id, dip);
    }

    pub fn seed_auth(&self, auth: PaymentAuthorization) {
        self.inner
            .lock()
            .unwrap()
            .auths
            .insert(auth.reference.clone(), auth);
    }

    pub fn dip(&self, id: DbId) -> Option<Dip> {
        self.inner.lock().unwrap().dips.get(&id).cloned()
    }

    pub fn auth(&self, reference: &str) -> Option<PaymentAuthorization> {
        self.inner.lock().unwrap().auths.get(reference).cloned()
    }

    pub fn auth_state(&self, reference: &str) -> Option<String> {
        self.auth(reference).map(|a| a.state)
    }
}

#[async_trait]
impl DipStore for MemStore {
    async fn fetch_dip(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        Ok(self.dip(dip_id))
    }

    async fn claim_if_active(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let Some(dip) = inner.dips.get_mut(&dip_id) else {
            return Ok(None);
        };
        if dip.status != DipStatus::Active.as_str() || dip.available_until <= now {
            return Ok(None);
        }
        dip.status = DipStatus::Claimed.as_str().into();
        dip.claimer_id = Some(claimer_id);
        dip.updated_at = now;
        Ok(Some(dip.clone()))
    }

    async fn expire_if_overdue(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let Some(dip) = inner.dips.get_mut(&dip_id) else {
            return Ok(None);
        };
        if dip.status != DipStatus::Active.as_str() || dip.available_until > now {
            return Ok(None);
        }
        dip.status = DipStatus::Expired.as_str().into();
        dip.updated_at = now;
        Ok(Some(dip.clone()))
    }

    async fn complete_if_claimed(&self, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let Some(dip) = inner.dips.get_mut(&dip_id) else {
            return Ok(None);
        };
        if dip.status != DipStatus::Claimed.as_str() {
            return Ok(None);
        }
        dip.status = DipStatus::Completed.as_str().into();
        dip.completed_at = Some(now);
        dip.updated_at = now;
        Ok(Some(dip.clone()))
    }

    async fn insert_authorization(
        &self,
        input: &NewAuthorization,
    ) -> Result<PaymentAuthorization, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner.auths.values().any(|a| {
            a.dip_id == input.dip_id
                && a.claimer_id == input.claimer_id
                && a.state != AuthorizationState::Voided.as_str()
        });
        if duplicate {
            return Err(sqlx::Error::Database(Box::new(FakeUniqueViolation::new(
                "uq_payment_authorizations_live",
            ))));
        }
        let auth = PaymentAuthorization {
            id: Uuid::new_v4(),
            reference: input.reference.clone(),
            dip_id: input.dip_id,
            claimer_id: input.claimer_id,
            amount: input.amount,
            platform_fee: input.platform_fee,
            state: AuthorizationState::Authorized.as_str().into(),
            created_at: Utc::now(),
            finalized_at: None,
        };
        inner.auths.insert(auth.reference.clone(), auth.clone());
        Ok(auth)
    }

    async fn authorization_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error> {
        Ok(self.auth(reference))
    }

    async fn live_authorization(
        &self,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<PaymentAuthorization>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .auths
            .values()
            .find(|a| {
                a.dip_id == dip_id
                    && a.claimer_id == claimer_id
                    && a.state == AuthorizationState::Authorized.as_str()
            })
            .cloned())
    }

    async fn finalize_authorization(
        &self,
        reference: &str,
        outcome: AuthorizationState,
    ) -> Result<Option<FinalizeOutcome>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let Some(auth) = inner.auths.get_mut(reference) else {
            return Ok(None);
        };
        if auth.state == AuthorizationState::Authorized.as_str() {
            auth.state = outcome.as_str().into();
            auth.finalized_at = Some(Utc::now());
            return Ok(Some(FinalizeOutcome::Applied(auth.clone())));
        }
        if auth.state == outcome.as_str() {
            return Ok(Some(FinalizeOutcome::NoOp(auth.clone())));
        }
        Ok(Some(FinalizeOutcome::Conflict {
            current: auth.state.clone(),
        }))
    }
}

/// A stand-in for Postgres error 23505 so the unique-violation mapping
/// is exercised without a database.
#[derive(Debug)]
pub struct FakeUniqueViolation {
    message: String,
    constraint: String,
}

impl FakeUniqueViolation {
    fn new(constraint: &str) -> Self {
        Self {
            message: format!("duplicate key value violates unique constraint \"{constraint}\""),
            constraint: constraint.to_string(),
        }
    }
}

impl fmt::Display for FakeUniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for FakeUniqueViolation {}

impl DatabaseError for FakeUniqueViolation {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn constraint(&self) -> Option<&str> {
        Some(&self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }
}

// ---------------------------------------------------------------------------
// MockProcessor
// ---------------------------------------------------------------------------

/// Recording processor: holds always succeed, captures and voids are
/// logged for assertions, captures can be made to fail on demand.
#[derive(Default)]
pub struct MockProcessor {
    counter: AtomicU64,
    pub captured: Mutex<Vec<String>>,
    pub voided: Mutex<Vec<String>>,
    pub fail_capture: AtomicBool,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured_refs(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }

    pub fn voided_refs(&self) -> Vec<String> {
        self.voided.lock().unwrap().clone()
    }

    pub fn set_fail_capture(&self, fail: bool) {
        self.fail_capture.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn authorize(&self, _request: &AuthorizationRequest) -> Result<String, ProcessorError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("pi_mem_{n}"))
    }

    async fn capture(&self, reference: &str) -> Result<(), ProcessorError> {
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(ProcessorError::Rejected {
                status: 402,
                body: "card_declined".into(),
            });
        }
        self.captured.lock().unwrap().push(reference.to_string());
        Ok(())
    }

    async fn void(&self, reference: &str) -> Result<(), ProcessorError> {
        self.voided.lock().unwrap().push(reference.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Meters of northward latitude displacement, in degrees.
pub fn north_offset_degrees(meters: f64) -> f64 {
    meters / 111_195.0
}

pub fn active_dip(owner_id: DbId, price: MinorUnits) -> Dip {
    dip_with_deadline(owner_id, price, Utc::now() + Duration::hours(1))
}

pub fn dip_with_deadline(owner_id: DbId, price: MinorUnits, available_until: Timestamp) -> Dip {
    let now = Utc::now();
    Dip {
        id: Uuid::new_v4(),
        dip_type: "seat".into(),
        lat: 40.0,
        lng: -74.0,
        available_until,
        price,
        access_method: "code".into(),
        rules: Some("keep it tidy".into()),
        access_instructions: Some("table 4, ask for Sam".into()),
        status: DipStatus::Active.as_str().into(),
        owner_id,
        claimer_id: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

pub fn authorized_hold(dip: &Dip, claimer_id: DbId, reference: &str) -> PaymentAuthorization {
    PaymentAuthorization {
        id: Uuid::new_v4(),
        reference: reference.to_string(),
        dip_id: dip.id,
        claimer_id,
        amount: dip.price,
        platform_fee: dip.price / 10,
        state: AuthorizationState::Authorized.as_str().into(),
        created_at: Utc::now(),
        finalized_at: None,
    }
}

/// Engine over a fresh [`MemStore`] with default settings (200 m
/// threshold, 10 % fee).
pub fn build_engine() -> (Arc<ClaimEngine<MemStore>>, Arc<MockProcessor>, Arc<EventBus>) {
    let processor = Arc::new(MockProcessor::new());
    let bus = Arc::new(EventBus::default());
    let engine = Arc::new(ClaimEngine::new(
        MemStore::new(),
        processor.clone() as Arc<dyn PaymentProcessor>,
        Arc::clone(&bus),
        ClaimConfig::default(),
    ));
    (engine, processor, bus)
}

/// Gate over a fresh [`MemStore`] with default settings.
pub fn build_gate() -> (PaymentGate<MemStore>, Arc<MockProcessor>) {
    let processor = Arc::new(MockProcessor::new());
    let gate = PaymentGate::new(
        MemStore::new(),
        processor.clone() as Arc<dyn PaymentProcessor>,
        ClaimConfig::default(),
    );
    (gate, processor)
}
