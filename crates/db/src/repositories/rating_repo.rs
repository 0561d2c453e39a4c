//! Repository for the `ratings` table and the derived profile aggregate.

use dibs_core::types::DbId;
use sqlx::PgPool;

use crate::models::rating::Rating;

/// Column list for `ratings` queries.
const COLUMNS: &str = "id, dip_id, rater_id, rated_id, score, created_at";

/// Provides rating persistence and aggregate recomputation.
pub struct RatingRepo;

impl RatingRepo {
    /// Insert a rating and recompute the target's aggregate, atomically.
    ///
    /// The transaction first locks the rated user's profile row, so two
    /// concurrent submissions for the same target serialize: the second
    /// waits, then recomputes over a snapshot that includes the first's
    /// committed row. The aggregate is always the mean over all received
    /// scores, never an incrementally drifting counter.
    ///
    /// A duplicate (dip, rater) pair surfaces as a 23505 on
    /// `uq_ratings_dip_rater`, which the caller maps to `AlreadyRated`.
    pub async fn submit(
        pool: &PgPool,
        dip_id: DbId,
        rater_id: DbId,
        rated_id: DbId,
        score: i16,
    ) -> Result<Rating, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM profiles WHERE id = $1 FOR UPDATE")
            .bind(rated_id)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO ratings (dip_id, rater_id, rated_id, score) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let rating = sqlx::query_as::<_, Rating>(&query)
            .bind(dip_id)
            .bind(rater_id)
            .bind(rated_id)
            .bind(score)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE profiles \
             SET average_rating = agg.avg_score, total_ratings = agg.cnt \
             FROM ( \
                 SELECT COALESCE(AVG(score), 0)::FLOAT8 AS avg_score, \
                        COUNT(*) AS cnt \
                 FROM ratings WHERE rated_id = $1 \
             ) agg \
             WHERE profiles.id = $1",
        )
        .bind(rated_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rating)
    }

    /// All ratings received by a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        rated_id: DbId,
    ) -> Result<Vec<Rating>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ratings \
             WHERE rated_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Rating>(&query)
            .bind(rated_id)
            .fetch_all(pool)
            .await
    }

    /// Whether (dip, rater) already rated this exchange.
    pub async fn exists(
        pool: &PgPool,
        dip_id: DbId,
        rater_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM ratings WHERE dip_id = $1 AND rater_id = $2)",
        )
        .bind(dip_id)
        .bind(rater_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
