//! Route definitions for the `/reports` resource.
//!
//! All endpoints require authentication.

use axum::routing::post;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// POST   /    -> create_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(reports::create_report))
}
