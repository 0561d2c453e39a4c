//! Repository for the `profiles` table.

use dibs_core::types::DbId;
use sqlx::PgPool;

use crate::models::profile::Profile;

/// Column list for `profiles` queries.
const COLUMNS: &str = "\
    id, display_name, phone, phone_verified, avatar_url, \
    average_rating, total_ratings, created_at";

/// Provides read access and first-seen registration for profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Fetch a profile by id.
    pub async fn get(pool: &PgPool, user_id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Register a user on first contact. Identity lives with the
    /// external provider; this only guarantees the row referenced by
    /// dips, ratings, and authorizations exists.
    pub async fn ensure(pool: &PgPool, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
