//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`DipEvent`] to the
//! `events` table. It runs as a long-lived background task and shuts down
//! gracefully when the bus sender is dropped.

use tokio::sync::broadcast;
use dibs_db::repositories::EventRepo;
use dibs_db::DbPool;

use crate::bus::DipEvent;

/// Background service that persists dip events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop.
    ///
    /// Subscribes to the event bus via the provided `receiver` and persists
    /// every event it receives. The loop exits when the channel is closed
    /// (i.e. the [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<DipEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.kind.event_type(),
                            dip_id = %event.dip.id,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `events` table as a full snapshot.
    async fn persist(pool: &DbPool, event: &DipEvent) -> Result<i64, sqlx::Error> {
        let payload = serde_json::to_value(&event.dip)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        EventRepo::insert(
            pool,
            event.kind.event_type(),
            Some(event.dip.id),
            event.actor_id,
            &payload,
        )
        .await
    }
}
