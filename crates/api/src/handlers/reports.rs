//! Handlers for the `/reports` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use dibs_core::error::CoreError;
use dibs_db::models::report::CreateReport;
use dibs_db::repositories::{DipRepo, ProfileRepo, ReportRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/reports
///
/// File an abuse report against a dip. Write-only from the API's
/// perspective; moderation reads the table directly.
pub async fn create_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReport>,
) -> AppResult<impl IntoResponse> {
    if input.reason.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "reason must not be empty".into(),
        )));
    }

    // The dip must exist, any lifecycle state is reportable.
    DipRepo::get(&state.pool, input.dip_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dip",
            id: input.dip_id,
        }))?;

    ProfileRepo::ensure(&state.pool, auth.user_id).await?;
    let report =
        ReportRepo::create(&state.pool, auth.user_id, input.dip_id, input.reason.trim()).await?;

    tracing::info!(dip_id = %input.dip_id, reporter_id = %auth.user_id, "Report filed");
    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}
