//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`DipEvent`]s.
//! It is shared via `Arc<EventBus>` across the application. Delivery to
//! subscribers is at-least-once from the consumer's perspective (a
//! reconnecting subscriber re-reads from a fresh query plus the live
//! stream) and carries no ordering guarantee across publishers -- which
//! is exactly the contract [`NearbyView`](crate::NearbyView) reconciles.

use dibs_core::types::DbId;
use dibs_db::models::dip::Dip;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DipEvent
// ---------------------------------------------------------------------------

/// The mutation kind a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DipEventKind {
    Insert,
    Update,
    Delete,
}

impl DipEventKind {
    /// Dot-separated event name used for the durable log.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Insert => "dip.insert",
            Self::Update => "dip.update",
            Self::Delete => "dip.delete",
        }
    }
}

/// One notification: the mutation kind and the full dip snapshot as of
/// that mutation. Deltas are never sent; duplicates are therefore
/// harmless to merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DipEvent {
    pub kind: DipEventKind,
    pub dip: Dip,
    /// The user whose request caused the mutation, when known. Expiry is
    /// actorless.
    pub actor_id: Option<DbId>,
}

impl DipEvent {
    pub fn insert(dip: Dip, actor_id: Option<DbId>) -> Self {
        Self {
            kind: DipEventKind::Insert,
            dip,
            actor_id,
        }
    }

    pub fn update(dip: Dip, actor_id: Option<DbId>) -> Self {
        Self {
            kind: DipEventKind::Update,
            dip,
            actor_id,
        }
    }

    pub fn delete(dip: Dip, actor_id: Option<DbId>) -> Self {
        Self {
            kind: DipEventKind::Delete,
            dip,
            actor_id,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published [`DipEvent`].
pub struct EventBus {
    sender: broadcast::Sender<DipEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are
    /// dropped and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DipEvent) {
        // SendError only means there are zero receivers right now.
        let _ = self.sender.send(event);
    }

    /// Open a new independent subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<DipEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
