//! Integration tests for dip lifecycle persistence.
//!
//! Exercises the repository layer against a real database:
//! - Create / fetch roundtrip and defaults
//! - Compare-and-swap claim (single winner, overdue guard)
//! - Lazy and bulk expiry
//! - Completion and owner cancel guards
//! - Nearby search filters and the per-user listings
//!
//! All tests are ignored by default; run them with `--ignored` against a
//! database reachable via `DATABASE_URL`.

use chrono::{Duration, Utc};
use dibs_db::models::dip::{CreateDip, NearbyFilter};
use dibs_db::repositories::{DipRepo, ProfileRepo};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    ProfileRepo::ensure(pool, id).await.unwrap();
    id
}

fn new_dip(minutes_left: i64) -> CreateDip {
    CreateDip {
        dip_type: "seat".to_string(),
        lat: 40.0,
        lng: -74.0,
        available_until: Utc::now() + Duration::minutes(minutes_left),
        price: 500,
        access_method: "code".to_string(),
        rules: None,
        access_instructions: Some("table 4, ask for Sam".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Test: Create / fetch roundtrip
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_create_and_get_roundtrip(pool: PgPool) {
    let owner = new_user(&pool).await;
    let created = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();

    assert_eq!(created.status, "active");
    assert_eq!(created.owner_id, owner);
    assert_eq!(created.claimer_id, None);
    assert_eq!(created.completed_at, None);
    assert_eq!(created.price, 500);

    let fetched = DipRepo::get(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.dip_type, "seat");
    assert_eq!(
        fetched.access_instructions.as_deref(),
        Some("table 4, ask for Sam")
    );

    assert!(DipRepo::get(&pool, Uuid::new_v4()).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: Claim is a single-winner compare-and-swap
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_claim_is_single_winner(pool: PgPool) {
    let owner = new_user(&pool).await;
    let alice = new_user(&pool).await;
    let bob = new_user(&pool).await;
    let dip = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();

    let won = DipRepo::claim_if_active(&pool, dip.id, alice)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(won.status, "claimed");
    assert_eq!(won.claimer_id, Some(alice));
    assert!(won.updated_at > dip.updated_at);

    // The second claimant finds the guard already violated.
    let lost = DipRepo::claim_if_active(&pool, dip.id, bob).await.unwrap();
    assert!(lost.is_none());

    let current = DipRepo::get(&pool, dip.id).await.unwrap().unwrap();
    assert_eq!(current.claimer_id, Some(alice));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_claim_rejects_overdue_dip(pool: PgPool) {
    let owner = new_user(&pool).await;
    let claimer = new_user(&pool).await;
    let dip = DipRepo::create(&pool, owner, &new_dip(-1)).await.unwrap();

    let claimed = DipRepo::claim_if_active(&pool, dip.id, claimer)
        .await
        .unwrap();
    assert!(claimed.is_none());
}

// ---------------------------------------------------------------------------
// Test: Expiry, lazy and bulk
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_expire_if_overdue_fires_once(pool: PgPool) {
    let owner = new_user(&pool).await;
    let dip = DipRepo::create(&pool, owner, &new_dip(-1)).await.unwrap();

    let expired = DipRepo::expire_if_overdue(&pool, dip.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(expired.status, "expired");

    // Racing readers see the guard already gone.
    assert!(DipRepo::expire_if_overdue(&pool, dip.id)
        .await
        .unwrap()
        .is_none());

    // A live dip is never touched.
    let live = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();
    assert!(DipRepo::expire_if_overdue(&pool, live.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_expire_overdue_sweeps_only_overdue(pool: PgPool) {
    let owner = new_user(&pool).await;
    let stale_a = DipRepo::create(&pool, owner, &new_dip(-5)).await.unwrap();
    let stale_b = DipRepo::create(&pool, owner, &new_dip(-1)).await.unwrap();
    let live = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();

    let swept = DipRepo::expire_overdue(&pool).await.unwrap();
    let mut ids: Vec<_> = swept.iter().map(|d| d.id).collect();
    ids.sort();
    let mut expected = vec![stale_a.id, stale_b.id];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(swept.iter().all(|d| d.status == "expired"));

    let untouched = DipRepo::get(&pool, live.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, "active");

    assert!(DipRepo::expire_overdue(&pool).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: Completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_complete_requires_claimed(pool: PgPool) {
    let owner = new_user(&pool).await;
    let claimer = new_user(&pool).await;
    let dip = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();

    // Not claimed yet.
    assert!(DipRepo::complete_if_claimed(&pool, dip.id)
        .await
        .unwrap()
        .is_none());

    DipRepo::claim_if_active(&pool, dip.id, claimer)
        .await
        .unwrap()
        .unwrap();

    let completed = DipRepo::complete_if_claimed(&pool, dip.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.status, "completed");
    assert!(completed.completed_at.is_some());

    // Second writer misses the guard.
    assert!(DipRepo::complete_if_claimed(&pool, dip.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: Owner cancel
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_delete_if_active_guards(pool: PgPool) {
    let owner = new_user(&pool).await;
    let stranger = new_user(&pool).await;
    let claimer = new_user(&pool).await;

    let dip = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();

    // Only the owner may cancel.
    assert!(DipRepo::delete_if_active(&pool, dip.id, stranger)
        .await
        .unwrap()
        .is_none());

    // A claimed dip cannot be cancelled.
    DipRepo::claim_if_active(&pool, dip.id, claimer)
        .await
        .unwrap()
        .unwrap();
    assert!(DipRepo::delete_if_active(&pool, dip.id, owner)
        .await
        .unwrap()
        .is_none());

    let cancellable = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();
    let deleted = DipRepo::delete_if_active(&pool, cancellable.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deleted.id, cancellable.id);
    assert!(DipRepo::get(&pool, cancellable.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: Nearby search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_nearby_orders_and_filters(pool: PgPool) {
    let owner = new_user(&pool).await;

    let close = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();

    // ~1.1 km north.
    let mut mid_input = new_dip(30);
    mid_input.lat = 40.01;
    mid_input.price = 900;
    mid_input.dip_type = "desk".to_string();
    let mid = DipRepo::create(&pool, owner, &mid_input).await.unwrap();

    // ~111 km north, outside any sensible radius.
    let mut far_input = new_dip(30);
    far_input.lat = 41.0;
    DipRepo::create(&pool, owner, &far_input).await.unwrap();

    // Overdue dips never show up.
    DipRepo::create(&pool, owner, &new_dip(-1)).await.unwrap();

    let found = DipRepo::nearby(&pool, 40.0, -74.0, 2_000.0, &NearbyFilter::default())
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|n| n.dip.id).collect();
    assert_eq!(ids, vec![close.id, mid.id]);
    assert!(found[0].distance_meters < 1.0);
    assert!((1_000.0..1_300.0).contains(&found[1].distance_meters));

    let cheap = DipRepo::nearby(
        &pool,
        40.0,
        -74.0,
        2_000.0,
        &NearbyFilter {
            max_price: Some(600),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cheap.len(), 1);
    assert_eq!(cheap[0].dip.id, close.id);

    let desks = DipRepo::nearby(
        &pool,
        40.0,
        -74.0,
        2_000.0,
        &NearbyFilter {
            types: vec!["desk".to_string()],
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(desks.len(), 1);
    assert_eq!(desks[0].dip.id, mid.id);

    let long_lived = DipRepo::nearby(
        &pool,
        40.0,
        -74.0,
        2_000.0,
        &NearbyFilter {
            min_remaining_secs: Some(3_600),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(long_lived.is_empty());
}

// ---------------------------------------------------------------------------
// Test: Per-user listings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a running Postgres"]
async fn test_per_user_listings(pool: PgPool) {
    let owner = new_user(&pool).await;
    let claimer = new_user(&pool).await;

    let open = DipRepo::create(&pool, owner, &new_dip(30)).await.unwrap();
    assert_eq!(
        DipRepo::active_for_owner(&pool, owner)
            .await
            .unwrap()
            .unwrap()
            .id,
        open.id
    );
    assert!(DipRepo::claimed_by_user(&pool, claimer)
        .await
        .unwrap()
        .is_none());

    DipRepo::claim_if_active(&pool, open.id, claimer)
        .await
        .unwrap()
        .unwrap();
    // Claimed dips still count as the owner's open dip.
    assert_eq!(
        DipRepo::active_for_owner(&pool, owner)
            .await
            .unwrap()
            .unwrap()
            .id,
        open.id
    );
    assert_eq!(
        DipRepo::claimed_by_user(&pool, claimer)
            .await
            .unwrap()
            .unwrap()
            .id,
        open.id
    );

    DipRepo::complete_if_claimed(&pool, open.id)
        .await
        .unwrap()
        .unwrap();
    assert!(DipRepo::active_for_owner(&pool, owner)
        .await
        .unwrap()
        .is_none());
    assert!(DipRepo::claimed_by_user(&pool, claimer)
        .await
        .unwrap()
        .is_none());

    // Both sides of the exchange see it in their history.
    let owner_history = DipRepo::history_for_user(&pool, owner).await.unwrap();
    assert_eq!(owner_history.len(), 1);
    assert_eq!(owner_history[0].id, open.id);
    let claimer_history = DipRepo::history_for_user(&pool, claimer).await.unwrap();
    assert_eq!(claimer_history.len(), 1);
}
