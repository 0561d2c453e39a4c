//! Payment processor integration.
//!
//! The rest of the system talks to the processor exclusively through the
//! [`PaymentProcessor`] trait: place a hold (`authorize`), settle it
//! (`capture`), or release it (`void`). [`StripeProcessor`] is the
//! production implementation over the Stripe PaymentIntents API; tests
//! substitute their own implementations.

pub mod processor;
pub mod stripe;

pub use processor::{AuthorizationRequest, PaymentProcessor, ProcessorError};
pub use stripe::{StripeConfig, StripeProcessor};
