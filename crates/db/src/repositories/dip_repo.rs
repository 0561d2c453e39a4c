//! Repository for the `dips` table.
//!
//! The three lifecycle mutations (`claim_if_active`, `expire_if_overdue`,
//! `complete_if_claimed`) are compare-and-swap updates: the status guard
//! sits in the `WHERE` clause of a single `UPDATE ... RETURNING`, so the
//! row either transitions exactly once or the statement affects nothing.
//! `None` from any of them means the guard no longer held at write time.

use dibs_core::lifecycle::DipStatus;
use dibs_core::types::DbId;
use sqlx::PgPool;

use crate::models::dip::{CreateDip, Dip, NearbyDip, NearbyFilter};

/// Column list for `dips` queries.
const COLUMNS: &str = "\
    id, type, lat, lng, available_until, price, access_method, rules, \
    access_instructions, status, owner_id, claimer_id, \
    created_at, updated_at, completed_at";

/// Default nearby-search radius in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 2_000.0;

/// Maximum rows returned by the history listing.
const HISTORY_LIMIT: i64 = 20;

/// Provides CRUD and lifecycle operations for dips.
pub struct DipRepo;

impl DipRepo {
    /// Insert a new active dip owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateDip,
    ) -> Result<Dip, sqlx::Error> {
        let query = format!(
            "INSERT INTO dips \
                 (type, lat, lng, available_until, price, access_method, \
                  rules, access_instructions, status, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(&input.dip_type)
            .bind(input.lat)
            .bind(input.lng)
            .bind(input.available_until)
            .bind(input.price)
            .bind(&input.access_method)
            .bind(&input.rules)
            .bind(&input.access_instructions)
            .bind(DipStatus::Active.as_str())
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }

    /// Fetch a dip by id.
    pub async fn get(pool: &PgPool, dip_id: DbId) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dips WHERE id = $1");
        sqlx::query_as::<_, Dip>(&query)
            .bind(dip_id)
            .fetch_optional(pool)
            .await
    }

    /// Live dips within `radius_meters` of the query point, nearest
    /// first, with the great-circle distance computed in SQL.
    pub async fn nearby(
        pool: &PgPool,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        filter: &NearbyFilter,
    ) -> Result<Vec<NearbyDip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, distance_meters FROM ( \
                 SELECT d.*, 2 * 6371000 * asin(sqrt( \
                     power(sin(radians(d.lat - $1) / 2), 2) \
                     + cos(radians($1)) * cos(radians(d.lat)) \
                       * power(sin(radians(d.lng - $2) / 2), 2) \
                 )) AS distance_meters \
                 FROM dips d \
                 WHERE d.status = $4 AND d.available_until > NOW() \
             ) q \
             WHERE q.distance_meters <= $3 \
               AND ($5::BIGINT IS NULL OR q.price <= $5) \
               AND ($6::TEXT[] IS NULL OR q.type = ANY($6)) \
               AND ($7::BIGINT IS NULL OR \
                    q.available_until >= NOW() + ($7 * INTERVAL '1 second')) \
             ORDER BY q.distance_meters ASC"
        );
        let types = if filter.types.is_empty() {
            None
        } else {
            Some(filter.types.clone())
        };
        sqlx::query_as::<_, NearbyDip>(&query)
            .bind(lat)
            .bind(lng)
            .bind(radius_meters)
            .bind(DipStatus::Active.as_str())
            .bind(filter.max_price)
            .bind(types)
            .bind(filter.min_remaining_secs)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim a dip for `claimer_id`.
    ///
    /// Succeeds only if the row is still `active` and not yet overdue at
    /// write time. `None` means the compare-and-swap found the guard
    /// already violated -- claimed by someone else, expired, completed,
    /// or past its deadline.
    pub async fn claim_if_active(
        pool: &PgPool,
        dip_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!(
            "UPDATE dips \
             SET status = $3, claimer_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $4 AND available_until > NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(dip_id)
            .bind(claimer_id)
            .bind(DipStatus::Claimed.as_str())
            .bind(DipStatus::Active.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Lazily expire an overdue dip. Idempotent: any number of readers
    /// may race on this; at most one update happens, the rest see `None`.
    pub async fn expire_if_overdue(
        pool: &PgPool,
        dip_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!(
            "UPDATE dips \
             SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3 AND available_until <= NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(dip_id)
            .bind(DipStatus::Expired.as_str())
            .bind(DipStatus::Active.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Bulk sweep for the background expiry job: expire every overdue
    /// active dip, returning the rows that transitioned.
    pub async fn expire_overdue(pool: &PgPool) -> Result<Vec<Dip>, sqlx::Error> {
        let query = format!(
            "UPDATE dips \
             SET status = $1, updated_at = NOW() \
             WHERE status = $2 AND available_until <= NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(DipStatus::Expired.as_str())
            .bind(DipStatus::Active.as_str())
            .fetch_all(pool)
            .await
    }

    /// Atomically complete a claimed dip, stamping `completed_at`.
    pub async fn complete_if_claimed(
        pool: &PgPool,
        dip_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!(
            "UPDATE dips \
             SET status = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(dip_id)
            .bind(DipStatus::Completed.as_str())
            .bind(DipStatus::Claimed.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Delete a still-active dip owned by `owner_id` (owner cancel).
    /// Returns the deleted row so a `delete` event can carry its
    /// snapshot.
    pub async fn delete_if_active(
        pool: &PgPool,
        dip_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!(
            "DELETE FROM dips \
             WHERE id = $1 AND owner_id = $2 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(dip_id)
            .bind(owner_id)
            .bind(DipStatus::Active.as_str())
            .fetch_optional(pool)
            .await
    }

    /// The owner's current open dip (active or claimed), if any.
    pub async fn active_for_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dips \
             WHERE owner_id = $1 AND status IN ($2, $3) \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(owner_id)
            .bind(DipStatus::Active.as_str())
            .bind(DipStatus::Claimed.as_str())
            .fetch_optional(pool)
            .await
    }

    /// The dip currently claimed by `user_id`, if any.
    pub async fn claimed_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Dip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dips \
             WHERE claimer_id = $1 AND status = $2 \
             ORDER BY updated_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(user_id)
            .bind(DipStatus::Claimed.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Finished dips (completed or expired) the user took part in,
    /// newest first.
    pub async fn history_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Dip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dips \
             WHERE (owner_id = $1 OR claimer_id = $1) AND status IN ($2, $3) \
             ORDER BY created_at DESC LIMIT $4"
        );
        sqlx::query_as::<_, Dip>(&query)
            .bind(user_id)
            .bind(DipStatus::Completed.as_str())
            .bind(DipStatus::Expired.as_str())
            .bind(HISTORY_LIMIT)
            .fetch_all(pool)
            .await
    }
}
