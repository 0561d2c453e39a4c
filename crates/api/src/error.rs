use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dibs_core::error::{ClaimError, CoreError, PaymentError, RatingError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain taxonomies from `dibs_core` and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A generic domain-level error from `dibs_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A claim arbitration outcome that is not a win.
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// A payment gate failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// A rating submission failure.
    #[error(transparent)]
    Rating(#[from] RatingError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            // --- Claim arbitration outcomes ---
            AppError::Claim(claim) => match claim {
                ClaimError::DipNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", claim.to_string())
                }
                ClaimError::DipNotActive => {
                    (StatusCode::CONFLICT, "DIP_NOT_AVAILABLE", claim.to_string())
                }
                ClaimError::TooFarAway { .. } => {
                    (StatusCode::FORBIDDEN, "TOO_FAR_AWAY", claim.to_string())
                }
                ClaimError::OwnClaimForbidden => (
                    StatusCode::FORBIDDEN,
                    "OWN_CLAIM_FORBIDDEN",
                    claim.to_string(),
                ),
                ClaimError::PaymentNotAuthorized => (
                    StatusCode::PAYMENT_REQUIRED,
                    "PAYMENT_NOT_AUTHORIZED",
                    claim.to_string(),
                ),
                ClaimError::PaymentMismatch => {
                    (StatusCode::CONFLICT, "PAYMENT_MISMATCH", claim.to_string())
                }
                ClaimError::AlreadyClaimed => {
                    (StatusCode::CONFLICT, "ALREADY_CLAIMED", claim.to_string())
                }
                ClaimError::Core(core) => classify_core_error(core),
            },

            // --- Payment gate failures ---
            AppError::Payment(payment) => match payment {
                PaymentError::DipNotFound(_) | PaymentError::AuthorizationNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", payment.to_string())
                }
                PaymentError::DipNotAvailable => (
                    StatusCode::CONFLICT,
                    "DIP_NOT_AVAILABLE",
                    payment.to_string(),
                ),
                PaymentError::PriceMismatch => {
                    (StatusCode::CONFLICT, "PRICE_MISMATCH", payment.to_string())
                }
                PaymentError::OwnClaimForbidden => (
                    StatusCode::FORBIDDEN,
                    "OWN_CLAIM_FORBIDDEN",
                    payment.to_string(),
                ),
                PaymentError::AlreadyFinalized { .. } => (
                    StatusCode::CONFLICT,
                    "ALREADY_FINALIZED",
                    payment.to_string(),
                ),
                PaymentError::Processor(msg) => {
                    tracing::error!(error = %msg, "Payment processor error");
                    (
                        StatusCode::BAD_GATEWAY,
                        "PROCESSOR_ERROR",
                        payment.to_string(),
                    )
                }
                PaymentError::Core(core) => classify_core_error(core),
            },

            // --- Rating failures ---
            AppError::Rating(rating) => match rating {
                RatingError::InvalidScore(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_SCORE", rating.to_string())
                }
                RatingError::AlreadyRated => {
                    (StatusCode::CONFLICT, "ALREADY_RATED", rating.to_string())
                }
                RatingError::InvalidExchange => (
                    StatusCode::FORBIDDEN,
                    "INVALID_EXCHANGE",
                    rating.to_string(),
                ),
                RatingError::Core(core) => classify_core_error(core),
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] to an HTTP status, error code, and message.
fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Whether `err` is a unique-constraint violation on the named constraint
/// or index.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
