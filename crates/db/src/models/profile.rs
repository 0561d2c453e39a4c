//! User profile model.
//!
//! Identity issuance (phone verification, login) is an external
//! collaborator; this table only mirrors the users the service has seen
//! plus the derived rating aggregate.

use dibs_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `profiles` table.
///
/// `average_rating` and `total_ratings` are derived values recomputed by
/// `RatingRepo::submit` inside the same transaction as the rating
/// insert; they are never edited independently.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: DbId,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub avatar_url: Option<String>,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub created_at: Timestamp,
}
