//! Core traits shared by records and repositories

use chrono::{DateTime, Utc};

/// Record identifier (UUID in simple form)
pub type Id = String;

/// Base trait for stored records
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;

    fn id(&self) -> &str;

    /// Values that must be unique across records of this type, as `(field, value)`
    ///
    /// Empty values are not considered.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Records with creation and update timestamps
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn touch(&mut self);
}

/// Fresh record identifier
pub fn new_id() -> Id {
    uuid::Uuid::new_v4().simple().to_string()
}
