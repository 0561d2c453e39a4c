//! Rating rules and aggregate math.
//!
//! A rating is valid only for a completed exchange, submitted by one
//! participant about the other. A user's displayed average is a derived
//! value recomputed from all received scores, never an independently
//! mutated counter, so concurrent submissions cannot drift.

use crate::error::RatingError;
use crate::lifecycle::DipStatus;
use crate::types::DbId;

/// Inclusive score bounds.
pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

/// Check the 1–5 score range.
pub fn validate_score(score: i16) -> Result<(), RatingError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(RatingError::InvalidScore(score))
    }
}

/// Check that (rater, rated) are the two participants of a completed
/// exchange: the dip is `completed`, the rater is one of {owner,
/// claimer}, and the rated user is the other.
pub fn validate_exchange(
    status: DipStatus,
    owner_id: DbId,
    claimer_id: Option<DbId>,
    rater_id: DbId,
    rated_id: DbId,
) -> Result<(), RatingError> {
    if status != DipStatus::Completed {
        return Err(RatingError::InvalidExchange);
    }
    let Some(claimer_id) = claimer_id else {
        return Err(RatingError::InvalidExchange);
    };
    let valid_pair = (rater_id == owner_id && rated_id == claimer_id)
        || (rater_id == claimer_id && rated_id == owner_id);
    if valid_pair {
        Ok(())
    } else {
        Err(RatingError::InvalidExchange)
    }
}

/// Mean and count over all received scores. Empty input yields (0.0, 0),
/// matching a profile that has never been rated.
pub fn aggregate(scores: &[i16]) -> (f64, i64) {
    if scores.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = scores.iter().map(|s| *s as i64).sum();
    (sum as f64 / scores.len() as f64, scores.len() as i64)
}
