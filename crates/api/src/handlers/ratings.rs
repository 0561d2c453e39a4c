//! Handlers for the `/ratings` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use dibs_core::error::{CoreError, RatingError};
use dibs_core::rating::{validate_exchange, validate_score};
use dibs_core::types::DbId;
use dibs_db::models::rating::SubmitRating;
use dibs_db::repositories::{DipRepo, ProfileRepo, RatingRepo};

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/ratings
///
/// Rate the counterpart of a completed exchange. One rating per
/// (exchange, rater); the target's profile aggregate is recomputed in
/// the same transaction.
pub async fn submit_rating(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitRating>,
) -> AppResult<impl IntoResponse> {
    validate_score(input.score).map_err(AppError::Rating)?;

    let dip = DipRepo::get(&state.pool, input.dip_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dip",
            id: input.dip_id,
        }))?;

    let status = dip.status().map_err(AppError::Core)?;
    validate_exchange(
        status,
        dip.owner_id,
        dip.claimer_id,
        auth.user_id,
        input.rated_id,
    )
    .map_err(AppError::Rating)?;

    ProfileRepo::ensure(&state.pool, input.rated_id).await?;

    let rating = RatingRepo::submit(
        &state.pool,
        input.dip_id,
        auth.user_id,
        input.rated_id,
        input.score,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "uq_ratings_dip_rater") {
            AppError::Rating(RatingError::AlreadyRated)
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(
        dip_id = %input.dip_id,
        rater_id = %auth.user_id,
        rated_id = %input.rated_id,
        score = input.score,
        "Rating submitted"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: rating })))
}

/// GET /api/v1/ratings/users/{id}
///
/// All ratings a user has received, newest first.
pub async fn list_ratings_for_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let ratings = RatingRepo::list_for_user(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: ratings }))
}
