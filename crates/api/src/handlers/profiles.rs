//! Handlers for the `/profiles` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use dibs_core::error::CoreError;
use dibs_core::types::DbId;
use dibs_db::repositories::ProfileRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/profiles/{id}
///
/// Public profile view: display name and the derived rating aggregate.
pub async fn get_profile(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let profile = ProfileRepo::get(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: user_id,
        }))?;
    Ok(Json(DataResponse { data: profile }))
}

/// GET /api/v1/profiles/me
///
/// The caller's own profile, registering it on first contact.
pub async fn get_my_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    ProfileRepo::ensure(&state.pool, auth.user_id).await?;
    let profile = ProfileRepo::get(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: auth.user_id,
        }))?;
    Ok(Json(DataResponse { data: profile }))
}
