//! Repository for the `reports` table.

use dibs_core::types::DbId;
use sqlx::PgPool;

use crate::models::report::Report;

/// Column list for `reports` queries.
const COLUMNS: &str = "id, dip_id, reporter_id, reason, created_at";

/// Write-only persistence for abuse reports.
pub struct ReportRepo;

impl ReportRepo {
    /// File a report against a dip.
    pub async fn create(
        pool: &PgPool,
        reporter_id: DbId,
        dip_id: DbId,
        reason: &str,
    ) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports (dip_id, reporter_id, reason) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(dip_id)
            .bind(reporter_id)
            .bind(reason)
            .fetch_one(pool)
            .await
    }
}
