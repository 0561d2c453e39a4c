//! Payment gate behaviour over the in-memory store: hold placement
//! checks, the live-hold uniqueness backstop, and finalize idempotency.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use uuid::Uuid;

use dibs_core::error::{CoreError, PaymentError};
use dibs_core::lifecycle::DipStatus;

use common::{active_dip, build_gate, dip_with_deadline};

#[tokio::test]
async fn test_authorize_places_and_records_hold() {
    let (gate, _processor) = build_gate();

    let owner = Uuid::new_v4();
    let claimer = Uuid::new_v4();
    let dip = active_dip(owner, 999);
    gate.store().seed_dip(dip.clone());

    let auth = gate.authorize(dip.id, claimer, 999).await.unwrap();
    assert_eq!(auth.amount, 999);
    // 10% of 999 rounds to 100.
    assert_eq!(auth.platform_fee, 100);
    assert_eq!(auth.state, "authorized");
    assert_eq!(
        gate.store().auth_state(&auth.reference).unwrap(),
        "authorized"
    );
}

#[tokio::test]
async fn test_authorize_rejects_stale_price() {
    let (gate, _processor) = build_gate();

    let dip = active_dip(Uuid::new_v4(), 500);
    gate.store().seed_dip(dip.clone());

    let err = gate
        .authorize(dip.id, Uuid::new_v4(), 450)
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::PriceMismatch);
}

#[tokio::test]
async fn test_authorize_rejects_owner() {
    let (gate, _processor) = build_gate();

    let owner = Uuid::new_v4();
    let dip = active_dip(owner, 500);
    gate.store().seed_dip(dip.clone());

    let err = gate.authorize(dip.id, owner, 500).await.unwrap_err();
    assert_matches!(err, PaymentError::OwnClaimForbidden);
}

#[tokio::test]
async fn test_authorize_rejects_unavailable_dips() {
    let (gate, _processor) = build_gate();

    // Overdue but not yet expired.
    let overdue = dip_with_deadline(Uuid::new_v4(), 500, Utc::now() - Duration::seconds(1));
    gate.store().seed_dip(overdue.clone());
    let err = gate
        .authorize(overdue.id, Uuid::new_v4(), 500)
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::DipNotAvailable);

    // Already claimed.
    let mut claimed = active_dip(Uuid::new_v4(), 500);
    claimed.status = DipStatus::Claimed.as_str().into();
    claimed.claimer_id = Some(Uuid::new_v4());
    gate.store().seed_dip(claimed.clone());
    let err = gate
        .authorize(claimed.id, Uuid::new_v4(), 500)
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::DipNotAvailable);

    // Unknown.
    let missing = Uuid::new_v4();
    let err = gate.authorize(missing, Uuid::new_v4(), 500).await.unwrap_err();
    assert_matches!(err, PaymentError::DipNotFound(id) if id == missing);
}

#[tokio::test]
async fn test_double_authorize_conflicts_and_releases_orphan() {
    let (gate, processor) = build_gate();

    let dip = active_dip(Uuid::new_v4(), 500);
    let claimer = Uuid::new_v4();
    gate.store().seed_dip(dip.clone());

    let first = gate.authorize(dip.id, claimer, 500).await.unwrap();
    let err = gate.authorize(dip.id, claimer, 500).await.unwrap_err();
    assert_matches!(err, PaymentError::Core(CoreError::Conflict(_)));

    // The second processor hold had no row to live in; it was voided.
    let voided = processor.voided_refs();
    assert_eq!(voided.len(), 1);
    assert_ne!(voided[0], first.reference);
    // The first hold is untouched.
    assert_eq!(
        gate.store().auth_state(&first.reference).unwrap(),
        "authorized"
    );
}

#[tokio::test]
async fn test_void_is_idempotent_and_capture_after_void_conflicts() {
    let (gate, processor) = build_gate();

    let dip = active_dip(Uuid::new_v4(), 500);
    let claimer = Uuid::new_v4();
    gate.store().seed_dip(dip.clone());
    let auth = gate.authorize(dip.id, claimer, 500).await.unwrap();

    let voided = gate.void(&auth.reference).await.unwrap();
    assert_eq!(voided.state, "voided");

    // Repeating the same finalize is a no-op; the processor is only
    // told once.
    let again = gate.void(&auth.reference).await.unwrap();
    assert_eq!(again.state, "voided");
    assert_eq!(processor.voided_refs().len(), 1);

    // The opposite finalize after a terminal state is a conflict.
    let err = gate.capture(&auth.reference).await.unwrap_err();
    assert_matches!(err, PaymentError::AlreadyFinalized { state } if state == "voided");
    assert!(processor.captured_refs().is_empty());
}

#[tokio::test]
async fn test_capture_then_capture_is_noop() {
    let (gate, processor) = build_gate();

    let dip = active_dip(Uuid::new_v4(), 500);
    let claimer = Uuid::new_v4();
    gate.store().seed_dip(dip.clone());
    let auth = gate.authorize(dip.id, claimer, 500).await.unwrap();

    gate.capture(&auth.reference).await.unwrap();
    let again = gate.capture(&auth.reference).await.unwrap();
    assert_eq!(again.state, "captured");
    assert_eq!(processor.captured_refs().len(), 1);
}

#[tokio::test]
async fn test_finalize_unknown_reference() {
    let (gate, _processor) = build_gate();
    let err = gate.void("pi_unknown").await.unwrap_err();
    assert_matches!(err, PaymentError::AuthorizationNotFound(r) if r == "pi_unknown");
}
