//! Claim arbitration and payment gating.
//!
//! [`store::DipStore`] is the persistence seam: the arbitrator and the
//! gate are written against it so their ordering and atomicity rules can
//! be exercised without a database. [`store::PgDipStore`] is the
//! production implementation over the repositories.

pub mod claim;
pub mod payment;
pub mod store;
