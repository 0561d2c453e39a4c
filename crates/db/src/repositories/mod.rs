//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod dip_repo;
pub mod event_repo;
pub mod payment_authorization_repo;
pub mod profile_repo;
pub mod rating_repo;
pub mod report_repo;

pub use dip_repo::DipRepo;
pub use event_repo::EventRepo;
pub use payment_authorization_repo::PaymentAuthorizationRepo;
pub use profile_repo::ProfileRepo;
pub use rating_repo::RatingRepo;
pub use report_repo::ReportRepo;
