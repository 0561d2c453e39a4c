pub mod dips;
pub mod health;
pub mod payments;
pub mod profiles;
pub mod ratings;
pub mod reports;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /dips                        create (POST)
/// /dips/nearby                 search around a point (GET)
/// /dips/{id}                   get (GET), cancel (DELETE)
/// /dips/{id}/claim             attempt claim (POST)
/// /dips/{id}/complete          finish exchange (POST)
/// /dips/mine/active            own open dip (GET)
/// /dips/mine/claimed           currently claimed dip (GET)
/// /dips/mine/history           finished exchanges (GET)
///
/// /payments/authorize          place a hold (POST)
/// /payments/{reference}        own hold (GET)
/// /payments/{reference}/void   release a hold (POST)
///
/// /ratings                     rate a completed exchange (POST)
/// /ratings/users/{id}          ratings received (GET)
///
/// /profiles/me                 own profile (GET)
/// /profiles/{id}               public profile (GET)
///
/// /reports                     file an abuse report (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dips", dips::router())
        .nest("/payments", payments::router())
        .nest("/ratings", ratings::router())
        .nest("/profiles", profiles::router())
        .nest("/reports", reports::router())
}
