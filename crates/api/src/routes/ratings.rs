//! Route definitions for the `/ratings` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ratings;
use crate::state::AppState;

/// Routes mounted at `/ratings`.
///
/// ```text
/// POST   /                -> submit_rating
/// GET    /users/{id}      -> list_ratings_for_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(ratings::submit_rating))
        .route("/users/{id}", get(ratings::list_ratings_for_user))
}
