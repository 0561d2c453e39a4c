/// All entities are keyed by UUID (v4, generated by the database).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts are integer minor currency units (e.g. cents).
pub type MinorUnits = i64;
