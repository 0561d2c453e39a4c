//! Route definitions for the `/payments` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST   /authorize           -> authorize_payment
/// GET    /{reference}         -> get_payment
/// POST   /{reference}/void    -> void_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/authorize", post(payments::authorize_payment))
        .route("/{reference}", get(payments::get_payment))
        .route("/{reference}/void", post(payments::void_payment))
}
