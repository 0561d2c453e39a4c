//! Row structs and DTOs for the `dibs` schema.

pub mod dip;
pub mod payment_authorization;
pub mod profile;
pub mod rating;
pub mod report;
