//! Handlers for the `/dips` resource.
//!
//! All endpoints require authentication via [`AuthUser`]. Reads go
//! through [`Dip::redacted`] so `access_instructions` only reach the
//! owner, or the claimer once the dip is claimed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use dibs_core::countdown::{is_expired, time_left, TimeLeft};
use dibs_core::dip::{validate_access_method, validate_dip_type};
use dibs_core::error::CoreError;
use dibs_core::geo::Location;
use dibs_core::types::{DbId, MinorUnits};
use dibs_db::models::dip::{CreateDip, Dip, NearbyFilter};
use dibs_db::repositories::{DipRepo, ProfileRepo};
use dibs_events::DipEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// A dip plus its server-computed countdown.
#[derive(Debug, Serialize)]
pub struct DipDetail {
    #[serde(flatten)]
    pub dip: Dip,
    pub time_left: TimeLeft,
}

impl DipDetail {
    fn new(dip: Dip) -> Self {
        let time_left = time_left(dip.available_until, Utc::now());
        Self { dip, time_left }
    }
}

/// Query parameters for the nearby search.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in meters; defaults to the server-side cap.
    pub radius_meters: Option<f64>,
    pub max_price: Option<MinorUnits>,
    /// Comma-separated dip types, e.g. `seat,desk`.
    pub types: Option<String>,
    pub min_remaining_secs: Option<i64>,
}

/// Request body for `POST /dips/{id}/claim`.
#[derive(Debug, Deserialize)]
pub struct ClaimDip {
    /// The claimant's current position.
    pub lat: f64,
    pub lng: f64,
    /// Processor reference of the claimant's payment hold.
    pub payment_reference: String,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/dips
///
/// Publish a new dip. Returns 201 with the created dip; subscribers see
/// an `insert` event.
pub async fn create_dip(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDip>,
) -> AppResult<impl IntoResponse> {
    validate_create(&input)?;

    ProfileRepo::ensure(&state.pool, auth.user_id).await?;
    let dip = DipRepo::create(&state.pool, auth.user_id, &input).await?;

    state
        .event_bus
        .publish(DipEvent::insert(dip.clone(), Some(auth.user_id)));
    tracing::info!(dip_id = %dip.id, owner_id = %auth.user_id, "Dip created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DipDetail::new(dip),
        }),
    ))
}

fn validate_create(input: &CreateDip) -> Result<(), AppError> {
    validate_dip_type(&input.dip_type)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    validate_access_method(&input.access_method)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    Location::new(input.lat, input.lng)
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    if input.price <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "price must be positive".into(),
        )));
    }
    if is_expired(input.available_until, Utc::now()) {
        return Err(AppError::Core(CoreError::Validation(
            "available_until must be in the future".into(),
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// GET /api/v1/dips/nearby
///
/// Active, not-yet-overdue dips around a point, nearest first, with
/// optional price/type/remaining-time filters.
pub async fn nearby_dips(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NearbyQuery>,
) -> AppResult<impl IntoResponse> {
    Location::new(params.lat, params.lng)
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let radius = params
        .radius_meters
        .unwrap_or(dibs_db::repositories::dip_repo::DEFAULT_RADIUS_METERS)
        .min(dibs_db::repositories::dip_repo::DEFAULT_RADIUS_METERS);

    let filter = NearbyFilter {
        max_price: params.max_price,
        types: params
            .types
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        min_remaining_secs: params.min_remaining_secs,
    };

    let mut found = DipRepo::nearby(&state.pool, params.lat, params.lng, radius, &filter).await?;
    for entry in &mut found {
        entry.dip = entry.dip.clone().redacted(Some(auth.user_id));
    }

    Ok(Json(DataResponse { data: found }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/dips/{id}
///
/// Fetch one dip. An overdue active dip is expired on read -- the caller
/// sees the post-expiry state, never a stale `active`.
pub async fn get_dip(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dip_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut dip = DipRepo::get(&state.pool, dip_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dip",
            id: dip_id,
        }))?;

    if dip.is_active() && is_expired(dip.available_until, Utc::now()) {
        state.engine.expire_and_publish(dip_id).await;
        dip = DipRepo::get(&state.pool, dip_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Dip",
                id: dip_id,
            }))?;
    }

    let dip = dip.redacted(Some(auth.user_id));
    Ok(Json(DataResponse {
        data: DipDetail::new(dip),
    }))
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// POST /api/v1/dips/{id}/claim
///
/// Attempt to claim. At most one claimant ever succeeds; rivals get 409
/// and their holds are voided.
pub async fn claim_dip(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dip_id): Path<DbId>,
    Json(input): Json<ClaimDip>,
) -> AppResult<impl IntoResponse> {
    ProfileRepo::ensure(&state.pool, auth.user_id).await?;

    let dip = state
        .engine
        .attempt_claim(
            dip_id,
            auth.user_id,
            Location::new(input.lat, input.lng),
            &input.payment_reference,
        )
        .await?;

    // The claimer is entitled to the instructions from this moment.
    let dip = dip.redacted(Some(auth.user_id));
    Ok(Json(DataResponse {
        data: DipDetail::new(dip),
    }))
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// POST /api/v1/dips/{id}/complete
///
/// Mark the exchange finished. Owner or claimer may call it; repeating
/// it is a no-op.
pub async fn complete_dip(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dip_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dip = state.engine.complete(dip_id, auth.user_id).await?;
    let dip = dip.redacted(Some(auth.user_id));
    Ok(Json(DataResponse {
        data: DipDetail::new(dip),
    }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// DELETE /api/v1/dips/{id}
///
/// Owner withdraws a still-active dip. Subscribers see a `delete` event.
/// Returns 204; a claimed dip can no longer be cancelled.
pub async fn cancel_dip(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dip_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = DipRepo::delete_if_active(&state.pool, dip_id, auth.user_id).await?;

    match deleted {
        Some(dip) => {
            state
                .event_bus
                .publish(DipEvent::delete(dip, Some(auth.user_id)));
            tracing::info!(dip_id = %dip_id, owner_id = %auth.user_id, "Dip cancelled");
            Ok(StatusCode::NO_CONTENT)
        }
        None => {
            // Explain the refusal: wrong owner, wrong state, or gone.
            let current =
                DipRepo::get(&state.pool, dip_id)
                    .await?
                    .ok_or(AppError::Core(CoreError::NotFound {
                        entity: "Dip",
                        id: dip_id,
                    }))?;
            if current.owner_id != auth.user_id {
                Err(AppError::Core(CoreError::Forbidden(
                    "Only the owner can cancel a dip".into(),
                )))
            } else {
                Err(AppError::Core(CoreError::Conflict(
                    "Only an active dip can be cancelled".into(),
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Mine
// ---------------------------------------------------------------------------

/// GET /api/v1/dips/mine/active
///
/// The caller's current open dip as an owner (active or claimed).
pub async fn my_active_dip(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dip = DipRepo::active_for_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: dip.map(DipDetail::new),
    }))
}

/// GET /api/v1/dips/mine/claimed
///
/// The dip the caller currently holds a claim on.
pub async fn my_claimed_dip(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dip = DipRepo::claimed_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: dip.map(DipDetail::new),
    }))
}

/// GET /api/v1/dips/mine/history
///
/// Finished exchanges (completed or expired) the caller took part in.
pub async fn my_history(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dips = DipRepo::history_for_user(&state.pool, auth.user_id).await?;
    let dips: Vec<Dip> = dips
        .into_iter()
        .map(|d| d.redacted(Some(auth.user_id)))
        .collect();
    Ok(Json(DataResponse { data: dips }))
}
