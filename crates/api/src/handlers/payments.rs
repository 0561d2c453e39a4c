//! Handlers for the `/payments` resource.
//!
//! The HTTP surface exposes placing and releasing holds; capture is
//! internal to the claim engine and the completion path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use dibs_core::error::CoreError;
use dibs_core::types::{DbId, MinorUnits};
use dibs_db::repositories::ProfileRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /payments/authorize`.
#[derive(Debug, Deserialize)]
pub struct AuthorizePayment {
    pub dip_id: DbId,
    /// Must equal the live dip price; a stale price is rejected.
    pub amount: MinorUnits,
}

/// POST /api/v1/payments/authorize
///
/// Place a hold for a dip the caller intends to claim. Returns 201 with
/// the recorded authorization; no money moves until the claim wins.
pub async fn authorize_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AuthorizePayment>,
) -> AppResult<impl IntoResponse> {
    ProfileRepo::ensure(&state.pool, auth.user_id).await?;

    let authorization = state
        .gate
        .authorize(input.dip_id, auth.user_id, input.amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: authorization,
        }),
    ))
}

/// GET /api/v1/payments/{reference}
///
/// The caller's own hold, by processor reference.
pub async fn get_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<impl IntoResponse> {
    let authorization = state.gate.get(&reference).await?;
    if authorization.claimer_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your authorization".into(),
        )));
    }
    Ok(Json(DataResponse {
        data: authorization,
    }))
}

/// POST /api/v1/payments/{reference}/void
///
/// Release the caller's own hold, e.g. after deciding not to claim.
/// Idempotent: voiding an already-voided hold returns it unchanged;
/// voiding a captured hold is a 409.
pub async fn void_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<impl IntoResponse> {
    let authorization = state.gate.get(&reference).await?;
    if authorization.claimer_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your authorization".into(),
        )));
    }

    let voided = state.gate.void(&reference).await?;
    Ok(Json(DataResponse { data: voided }))
}
