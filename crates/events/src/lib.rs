//! Dibs event infrastructure.
//!
//! Building blocks for the realtime mutation feed:
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DipEvent`] -- the canonical notification: an insert/update/delete
//!   kind plus a full dip snapshot (never a delta).
//! - [`NearbyView`] -- the reconciler: merges an unordered, at-least-once
//!   event stream into a consistent local working set.
//! - [`EventPersistence`] -- background service that durably writes every
//!   event to the `events` table.

pub mod bus;
pub mod persistence;
pub mod reconciler;

pub use bus::{DipEvent, DipEventKind, EventBus};
pub use persistence::EventPersistence;
pub use reconciler::NearbyView;
