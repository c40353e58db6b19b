//! Feedback intake.
//!
//! `POST /feedback`: stores a rating or suggestion. Only Gmail addresses
//! are accepted; the address is stored lowercased.

use std::sync::LazyLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::FeedbackKind;
use crate::models::NewFeedback;

static GMAIL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9._%+-]*@gmail\.com$").unwrap());

#[derive(Debug, Deserialize)]
pub struct FeedbackCreate {
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    #[serde(default)]
    pub kind: FeedbackKind,
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackOut {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    pub kind: FeedbackKind,
    pub rating: Option<u8>,
}

/// Check and normalize a submission.
pub fn validate(payload: FeedbackCreate) -> Result<NewFeedback, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }

    let email = payload.email.trim().to_lowercase();
    if !GMAIL_ADDRESS.is_match(&email) {
        return Err(ApiError::BadRequest(
            "Email must be a Gmail address (ends with @gmail.com)".into(),
        ));
    }

    let rating = match payload.rating {
        None => None,
        Some(r @ 1..=5) => Some(r as u8),
        Some(r) => {
            return Err(ApiError::BadRequest(format!(
                "rating must be between 1 and 5, got {r}"
            )))
        }
    };

    Ok(NewFeedback {
        name: name.to_string(),
        email,
        kind: payload.kind,
        rating,
        message: payload.message,
    })
}

/// `POST /feedback`
pub async fn submit(
    State(ctx): State<ApiContext>,
    payload: Result<Json<FeedbackCreate>, JsonRejection>,
) -> Result<Json<FeedbackOut>, ApiError> {
    let Json(payload) = payload?;
    let entry = validate(payload)?;

    let conn = ctx.core.open_db()?;
    let stored = db::insert_feedback(&conn, &entry)?;

    tracing::info!(feedback_id = stored.id, kind = %stored.kind, rating = ?stored.rating, "Feedback received");

    Ok(Json(FeedbackOut {
        id: stored.id,
        name: stored.name,
        email: stored.email,
        message: stored.message,
        kind: stored.kind,
        rating: stored.rating,
    }))
}
