use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::FeedbackKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub kind: FeedbackKind,
    pub rating: Option<u8>,
    pub message: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub kind: FeedbackKind,
    pub rating: Option<u8>,
    pub message: Option<String>,
}
