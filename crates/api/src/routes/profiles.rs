//! Route definitions for the `/profiles` resource.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::profiles;
use crate::state::AppState;

/// Routes mounted at `/profiles`.
///
/// ```text
/// GET    /me       -> get_my_profile
/// GET    /{id}     -> get_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(profiles::get_my_profile))
        .route("/{id}", get(profiles::get_profile))
}
