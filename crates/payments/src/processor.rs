//! The processor seam: two-phase holds as a trait.
//!
//! `authorize` places a hold and returns an opaque `reference`; the hold
//! is later settled with `capture` or released with `void`, both keyed
//! by that reference. Implementations must make `capture` and `void`
//! safe to retry: re-finalizing an already-finalized hold in the same
//! direction is a no-op, not an error.

use async_trait::async_trait;
use dibs_core::types::{DbId, MinorUnits};

/// Everything the processor needs to place a hold.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Total amount to hold, in minor units of `currency`.
    pub amount: MinorUnits,
    /// ISO currency code, lowercase (e.g. "usd").
    pub currency: String,
    /// Platform cut of `amount`, recorded with the hold for settlement
    /// reporting.
    pub platform_fee: MinorUnits,
    pub dip_id: DbId,
    pub claimer_id: DbId,
    pub owner_id: DbId,
}

/// Errors from the payment processor layer.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Processor request failed: {0}")]
    Request(String),

    /// The processor rejected the operation (declined card, bad
    /// reference, insufficient funds on capture, ...).
    #[error("Processor rejected operation ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The processor response could not be interpreted.
    #[error("Unexpected processor response: {0}")]
    Malformed(String),
}

/// A two-phase payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Place a hold for the given amount. Returns the processor's
    /// reference for the hold; no money moves yet.
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<String, ProcessorError>;

    /// Settle a previously placed hold.
    async fn capture(&self, reference: &str) -> Result<(), ProcessorError>;

    /// Release a previously placed hold without settling it.
    async fn void(&self, reference: &str) -> Result<(), ProcessorError>;
}
