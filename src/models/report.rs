use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::Severity;

/// Persisted diagnosis report. `recommendations` is stored as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub filename: Option<String>,
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub created_at: NaiveDateTime,
}

/// Fields needed to insert a new report row.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub filename: Option<String>,
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    pub recommendations: Vec<String>,
}
