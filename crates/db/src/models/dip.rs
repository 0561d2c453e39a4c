//! Dip entity model and DTOs.

use dibs_core::error::CoreError;
use dibs_core::geo::Location;
use dibs_core::lifecycle::DipStatus;
use dibs_core::types::{DbId, MinorUnits, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dips` table.
///
/// `status` carries the raw TEXT value; use [`Dip::status`] for the
/// typed state machine view. `access_instructions` must be stripped
/// before the row is shown to anyone but the owner or the claimer of a
/// claimed dip -- see [`Dip::redacted`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Dip {
    pub id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub dip_type: String,
    pub lat: f64,
    pub lng: f64,
    pub available_until: Timestamp,
    pub price: MinorUnits,
    pub access_method: String,
    pub rules: Option<String>,
    pub access_instructions: Option<String>,
    pub status: String,
    pub owner_id: DbId,
    pub claimer_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Dip {
    /// The dip's published location.
    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lng)
    }

    /// Typed lifecycle status. The schema CHECK constraint guarantees
    /// the stored value parses; an unknown value is a corrupt row.
    pub fn status(&self) -> Result<DipStatus, CoreError> {
        self.status
            .parse()
            .map_err(|e: String| CoreError::Internal(format!("dip {}: {e}", self.id)))
    }

    pub fn is_active(&self) -> bool {
        self.status == DipStatus::Active.as_str()
    }

    /// Whether `user` may see `access_instructions`: the owner always,
    /// the claimer once the dip has been claimed.
    pub fn reveals_instructions_to(&self, user: DbId) -> bool {
        self.owner_id == user || self.claimer_id == Some(user)
    }

    /// Copy with `access_instructions` removed unless `viewer` is
    /// entitled to them.
    pub fn redacted(mut self, viewer: Option<DbId>) -> Self {
        let entitled = viewer.is_some_and(|u| self.reveals_instructions_to(u));
        if !entitled {
            self.access_instructions = None;
        }
        self
    }
}

/// DTO for creating a dip via `POST /api/v1/dips`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDip {
    #[serde(rename = "type")]
    pub dip_type: String,
    pub lat: f64,
    pub lng: f64,
    pub available_until: Timestamp,
    pub price: MinorUnits,
    pub access_method: String,
    pub rules: Option<String>,
    pub access_instructions: Option<String>,
}

/// A dip returned by the nearby search, annotated with its distance
/// from the searcher.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NearbyDip {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub dip: Dip,
    /// Great-circle distance from the query point, in meters.
    pub distance_meters: f64,
}

/// Filters for the nearby search, matching the map view's filter bar.
#[derive(Debug, Clone, Default)]
pub struct NearbyFilter {
    /// Maximum price in minor units.
    pub max_price: Option<MinorUnits>,
    /// Restrict to these dip types. Empty means all types.
    pub types: Vec<String>,
    /// Minimum remaining seconds before `available_until`.
    pub min_remaining_secs: Option<i64>,
}
