//! Abuse report model. A thin passthrough: reports are written for the
//! moderation team, nothing in the service reads them back.

use dibs_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub dip_id: DbId,
    pub reporter_id: DbId,
    pub reason: String,
    pub created_at: Timestamp,
}

/// DTO for `POST /api/v1/reports`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub dip_id: DbId,
    pub reason: String,
}
