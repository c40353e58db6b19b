use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use super::parse_datetime;
use crate::db::DatabaseError;
use crate::models::enums::FeedbackKind;
use crate::models::{Feedback, NewFeedback};

type FeedbackRow = (i64, String, String, String, Option<u8>, Option<String>, String);

pub fn insert_feedback(conn: &Connection, feedback: &NewFeedback) -> Result<Feedback, DatabaseError> {
    conn.execute(
        "INSERT INTO feedback (name, email, kind, rating, message) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            feedback.name,
            feedback.email,
            feedback.kind.as_str(),
            feedback.rating,
            feedback.message,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_feedback(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Feedback".into(),
        id: id.to_string(),
    })
}

pub fn get_feedback(conn: &Connection, id: i64) -> Result<Option<Feedback>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, email, kind, rating, message, created_at FROM feedback WHERE id = ?1",
        params![id],
        read_row,
    )
    .optional()?
    .map(row_to_feedback)
    .transpose()
}

/// All feedback entries, newest first.
pub fn list_feedback(conn: &Connection) -> Result<Vec<Feedback>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, kind, rating, message, created_at
         FROM feedback ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([], read_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row_to_feedback(row?)?);
    }
    Ok(entries)
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedbackRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn row_to_feedback(row: FeedbackRow) -> Result<Feedback, DatabaseError> {
    let (id, name, email, kind, rating, message, created_at) = row;
    Ok(Feedback {
        id,
        name,
        email,
        kind: FeedbackKind::from_str(&kind)?,
        rating,
        message,
        created_at: parse_datetime(&created_at)?,
    })
}
