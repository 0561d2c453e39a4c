//! Background expiry sweeper.
//!
//! Lazy expiry only retires a dip when somebody looks at it; this sweep
//! catches the rest so an abandoned dip still leaves the searchable view
//! within one interval of its deadline. The bulk update uses the same
//! status guard as the lazy path, so the two never double-fire.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use dibs_db::repositories::DipRepo;
use dibs_events::{DipEvent, EventBus};

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Run the expiry sweep loop.
///
/// Expires every overdue active dip and broadcasts an update event per
/// transition. Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, bus: Arc<EventBus>, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(SWEEP_INTERVAL.as_secs());

    tracing::info!(interval_secs, "Expiry sweeper started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Expiry sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match DipRepo::expire_overdue(&pool).await {
                    Ok(expired) => {
                        if !expired.is_empty() {
                            tracing::info!(count = expired.len(), "Expiry sweep: dips expired");
                        }
                        for dip in expired {
                            bus.publish(DipEvent::update(dip, None));
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expiry sweep failed");
                    }
                }
            }
        }
    }
}
