//! Rating entity model and DTOs.

use dibs_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `ratings` table. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rating {
    pub id: DbId,
    pub dip_id: DbId,
    pub rater_id: DbId,
    pub rated_id: DbId,
    pub score: i16,
    pub created_at: Timestamp,
}

/// DTO for `POST /api/v1/ratings`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRating {
    pub dip_id: DbId,
    pub rated_id: DbId,
    pub score: i16,
}
