//! Repository layer: entity-scoped database operations.

mod feedback;
mod report;

pub use feedback::*;
pub use report::*;

/// Timestamp format used for `created_at` columns (SQLite `datetime('now')`).
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn parse_datetime(value: &str) -> Result<chrono::NaiveDateTime, super::DatabaseError> {
    chrono::NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map_err(|e| super::DatabaseError::ConstraintViolation(format!("created_at '{value}': {e}")))
}
