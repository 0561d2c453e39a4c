use std::sync::Arc;

use dibs_events::EventBus;

use crate::config::ServerConfig;
use crate::engine::claim::ClaimEngine;
use crate::engine::payment::PaymentGate;
use crate::engine::store::PgDipStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dibs_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing dip events.
    pub event_bus: Arc<EventBus>,
    /// Claim arbitrator over the Postgres store.
    pub engine: Arc<ClaimEngine<PgDipStore>>,
    /// Payment gate over the Postgres store.
    pub gate: Arc<PaymentGate<PgDipStore>>,
}
