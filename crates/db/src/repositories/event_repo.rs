//! Repository for the durable `events` table.

use dibs_core::types::DbId;
use sqlx::PgPool;

/// Provides append-only persistence for broadcast events.
pub struct EventRepo;

impl EventRepo {
    /// Append one event; returns its sequence id.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        dip_id: Option<DbId>,
        actor_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO events (event_type, dip_id, actor_id, payload) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event_type)
        .bind(dip_id)
        .bind(actor_id)
        .bind(payload)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
