//! Pure domain logic for the Dibs access-sharing platform.
//!
//! Everything in this crate is synchronous and side-effect free: the
//! lifecycle state machine, great-circle distance, countdown/expiry
//! prediction, rating rules, platform-fee math, and the error taxonomy
//! shared by the storage and API layers. I/O lives in `dibs-db`,
//! `dibs-payments`, and `dibs-api`.

pub mod countdown;
pub mod dip;
pub mod error;
pub mod fee;
pub mod geo;
pub mod lifecycle;
pub mod rating;
pub mod types;
