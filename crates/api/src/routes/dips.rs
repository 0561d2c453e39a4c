//! Route definitions for the `/dips` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::dips;
use crate::state::AppState;

/// Routes mounted at `/dips`.
///
/// ```text
/// POST   /                -> create_dip
/// GET    /nearby          -> nearby_dips
/// GET    /{id}            -> get_dip
/// DELETE /{id}            -> cancel_dip
/// POST   /{id}/claim      -> claim_dip
/// POST   /{id}/complete   -> complete_dip
/// GET    /mine/active     -> my_active_dip
/// GET    /mine/claimed    -> my_claimed_dip
/// GET    /mine/history    -> my_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(dips::create_dip))
        .route("/nearby", get(dips::nearby_dips))
        .route("/mine/active", get(dips::my_active_dip))
        .route("/mine/claimed", get(dips::my_claimed_dip))
        .route("/mine/history", get(dips::my_history))
        .route("/{id}", get(dips::get_dip).delete(dips::cancel_dip))
        .route("/{id}/claim", post(dips::claim_dip))
        .route("/{id}/complete", post(dips::complete_dip))
}
