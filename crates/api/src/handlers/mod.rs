//! Request handlers, one module per resource.

pub mod dips;
pub mod payments;
pub mod profiles;
pub mod ratings;
pub mod reports;
